//! Attribute values carried by schema templates and metadata sources.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::placeholder::is_placeholder;

/// Value of a global or variable attribute before it is written to a file.
///
/// Integer and float variants are widened to 64 bits; the writer narrows
/// them to the owning variable's type where the attribute is type-bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl AttrValue {
    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is an unresolved placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.as_text().map(is_placeholder).unwrap_or(false)
    }

    /// Parse vocabulary text as a number or comma-separated list of numbers.
    ///
    /// CDL type suffixes (`-127b`, `1.5f`) are ignored. Values containing
    /// a decimal point or exponent parse as floats, the rest as integers.
    /// Returns `None` if any element is not numeric.
    pub fn parse_numeric(raw: &str) -> Option<AttrValue> {
        let items: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        if items.is_empty() {
            return None;
        }

        let is_float = items.iter().any(|v| v.contains(['.', 'e', 'E']));
        if is_float {
            let values = items
                .iter()
                .map(|v| strip_cdl_suffix(v).parse::<f64>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some(match values.as_slice() {
                [single] => AttrValue::Float(*single),
                _ => AttrValue::Floats(values),
            })
        } else {
            let values = items
                .iter()
                .map(|v| strip_cdl_suffix(v).parse::<i64>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some(match values.as_slice() {
                [single] => AttrValue::Int(*single),
                _ => AttrValue::Ints(values),
            })
        }
    }

    /// Numeric values as f64, for scalar or array numeric variants.
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::Int(v) => Some(vec![*v as f64]),
            AttrValue::Float(v) => Some(vec![*v]),
            AttrValue::Ints(v) => Some(v.iter().map(|x| *x as f64).collect()),
            AttrValue::Floats(v) => Some(v.clone()),
            AttrValue::Text(_) => None,
        }
    }
}

fn strip_cdl_suffix(value: &str) -> &str {
    value.trim_end_matches(['b', 'B', 's', 'S', 'l', 'L', 'f', 'F', 'd', 'D'])
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(values: &[T]) -> String {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
        match self {
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Ints(v) => f.write_str(&join(v)),
            AttrValue::Floats(v) => f.write_str(&join(v)),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}
