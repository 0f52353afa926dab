//! Placeholder values marking metadata a human still has to supply.
//!
//! Any attribute value beginning with [`PLACEHOLDER_PREFIX`] is unresolved.
//! Downstream tooling greps for the token to check a file is complete, so
//! the prefix is part of the file contract.

/// Literal token that starts every placeholder value.
pub const PLACEHOLDER_PREFIX: &str = "CHANGE";

/// Returns true if the value is an unresolved placeholder.
pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

/// Placeholder for a global attribute, built from its vocabulary row.
///
/// Produces `CHANGE: <description>. Example: <example>`, dropping whichever
/// part the vocabulary leaves empty.
pub fn global_placeholder(description: &str, example: &str) -> String {
    let description = description.trim().trim_end_matches('.');
    let example = example.trim();
    match (description.is_empty(), example.is_empty()) {
        (true, true) => PLACEHOLDER_PREFIX.to_string(),
        (false, true) => format!("{PLACEHOLDER_PREFIX}: {description}."),
        (true, false) => format!("{PLACEHOLDER_PREFIX}: Example: {example}"),
        (false, false) => format!("{PLACEHOLDER_PREFIX}: {description}. Example: {example}"),
    }
}

/// Placeholder for a variable attribute whose vocabulary value is a
/// `<...>` template such as `<derived from file>`.
pub fn variable_placeholder(template: &str) -> String {
    let inner = template
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim();
    if inner.is_empty() {
        PLACEHOLDER_PREFIX.to_string()
    } else {
        format!("{PLACEHOLDER_PREFIX}: {inner}")
    }
}

/// Whether a raw vocabulary value is a template rather than a literal.
pub fn is_template(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || (value.starts_with('<') && value.ends_with('>'))
}
