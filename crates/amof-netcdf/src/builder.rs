//! Writing a new file from a [`ResolvedSchema`].
//!
//! Every dimension length is settled before the file system is touched:
//! caller-supplied lengths first, then fixed lengths from the vocabulary,
//! then whatever the [`DimensionLengthProvider`] returns. A missing or
//! invalid length fails with [`NetcdfError::DimensionValue`] and leaves no
//! file behind.

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead, Stdout, StdinLock, Write};
use std::path::{Path, PathBuf};

use amof_common::DimensionLength;
use amof_schema::{DimensionSpec, ResolvedSchema};
use netcdf::FileMut;
use tracing::{debug, info, warn};

use crate::error::{NetcdfError, NetcdfResult};
use crate::naming::FileNameComponents;
use crate::native::{add_variable, attribute_for, untyped_attribute};

/// Supplies lengths for dimensions the caller and vocabulary leave open.
pub trait DimensionLengthProvider {
    fn length(&mut self, dimension: &DimensionSpec) -> NetcdfResult<usize>;
}

/// Refuses every request; all lengths must be supplied up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl DimensionLengthProvider for NonInteractive {
    fn length(&mut self, dimension: &DimensionSpec) -> NetcdfResult<usize> {
        Err(NetcdfError::dimension(
            &dimension.name,
            "no length supplied and interactive input is disabled",
        ))
    }
}

/// Asks for each length on a line-oriented input, blocking until a line
/// arrives.
pub struct PromptProvider<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptProvider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptProvider<StdinLock<'static>, Stdout> {
    /// Prompt on the terminal.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> DimensionLengthProvider for PromptProvider<R, W> {
    fn length(&mut self, dimension: &DimensionSpec) -> NetcdfResult<usize> {
        if dimension.units.is_empty() {
            write!(self.output, "Enter length for dimension {}: ", dimension.name)?;
        } else {
            write!(
                self.output,
                "Enter length for dimension {} ({}): ",
                dimension.name, dimension.units
            )?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(NetcdfError::dimension(&dimension.name, "input closed"));
        }
        parse_length(&dimension.name, line.trim())
    }
}

fn parse_length(dimension: &str, raw: &str) -> NetcdfResult<usize> {
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n as usize),
        Ok(n) => Err(NetcdfError::dimension(dimension, format!("{} is not positive", n))),
        Err(_) => Err(NetcdfError::dimension(
            dimension,
            format!("'{}' is not an integer", raw),
        )),
    }
}

/// A freshly created file, still open for writing.
pub struct BuiltFile {
    pub path: PathBuf,
    pub file: FileMut,
}

/// Builds one file from a schema.
pub struct FileBuilder<'a> {
    schema: &'a ResolvedSchema,
    lengths: HashMap<String, usize>,
    provider: Box<dyn DimensionLengthProvider + 'a>,
}

impl<'a> FileBuilder<'a> {
    /// Builder with no caller lengths and no interactive input.
    pub fn new(schema: &'a ResolvedSchema) -> Self {
        Self {
            schema,
            lengths: HashMap::new(),
            provider: Box::new(NonInteractive),
        }
    }

    /// Caller-supplied lengths; these take precedence over the vocabulary.
    pub fn with_lengths<I, S>(mut self, lengths: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        self.lengths
            .extend(lengths.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn with_provider(mut self, provider: impl DimensionLengthProvider + 'a) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Settle every dimension length. `None` marks an unlimited dimension.
    pub fn resolve_lengths(&mut self) -> NetcdfResult<Vec<(String, Option<usize>)>> {
        for name in self.lengths.keys() {
            if self.schema.dimension(name).is_none() {
                warn!(dimension = %name, "Length supplied for a dimension not in the schema");
            }
        }

        let mut resolved = Vec::with_capacity(self.schema.dimensions.len());
        for dim in &self.schema.dimensions {
            let length = match (self.lengths.get(&dim.name), dim.length) {
                (_, DimensionLength::Unlimited) => None,
                (Some(&n), _) => Some(n),
                (None, DimensionLength::Fixed(n)) => Some(n),
                (None, DimensionLength::Open) => Some(self.provider.length(dim)?),
            };
            if length == Some(0) {
                return Err(NetcdfError::dimension(&dim.name, "0 is not positive"));
            }
            debug!(dimension = %dim.name, length = ?length, "Resolved dimension length");
            resolved.push((dim.name.clone(), length));
        }
        Ok(resolved)
    }

    /// Create the file in `location`, named from `name`, and write all
    /// dimensions, variables and attributes. The file is returned open.
    pub fn build(mut self, location: &Path, name: &FileNameComponents) -> NetcdfResult<BuiltFile> {
        let lengths = self.resolve_lengths()?;
        let path = location.join(name.file_name()?);

        let mut file = netcdf::create(&path)?;
        if let Err(e) = write_structure(&mut file, self.schema, &lengths) {
            drop(file);
            if let Err(remove) = fs::remove_file(&path) {
                warn!(path = ?path, error = %remove, "Failed to remove incomplete file");
            }
            return Err(e);
        }

        info!(
            path = ?path,
            dimensions = lengths.len(),
            variables = self.schema.variables.len(),
            "Created file"
        );
        Ok(BuiltFile { path, file })
    }
}

fn write_structure(
    file: &mut FileMut,
    schema: &ResolvedSchema,
    lengths: &[(String, Option<usize>)],
) -> NetcdfResult<()> {
    for (name, length) in lengths {
        match length {
            Some(n) => file.add_dimension(name, *n)?,
            None => file.add_unlimited_dimension(name)?,
        };
    }

    for spec in &schema.variables {
        let dims: Vec<&str> = spec.dimensions.iter().map(String::as_str).collect();
        let mut var = add_variable(file, &spec.name, &dims, spec.data_type)?;

        // The fill value has to be in place before any data is written.
        if let Some(fill) = spec.attribute("_FillValue") {
            var.put_attribute("_FillValue", attribute_for("_FillValue", fill, spec.data_type))?;
        }
        for (attr, value) in spec.attributes.iter().filter(|(k, _)| k != "_FillValue") {
            var.put_attribute(attr, attribute_for(attr, value, spec.data_type))?;
        }
    }

    for (name, value) in &schema.global_attributes {
        file.add_attribute(name, untyped_attribute(value))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn open_dim(name: &str) -> DimensionSpec {
        DimensionSpec {
            name: name.into(),
            length: DimensionLength::Open,
            units: "m".into(),
            common: false,
        }
    }

    #[test]
    fn test_prompt_provider_reads_line() {
        let mut output = Vec::new();
        let mut provider = PromptProvider::new(Cursor::new("42\n"), &mut output);
        assert_eq!(provider.length(&open_dim("altitude")).unwrap(), 42);
        drop(provider);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Enter length for dimension altitude (m): "
        );
    }

    #[test]
    fn test_prompt_provider_rejects_bad_input() {
        for input in ["0\n", "-3\n", "ten\n", ""] {
            let mut provider = PromptProvider::new(Cursor::new(input), Vec::new());
            let err = provider.length(&open_dim("time")).unwrap_err();
            assert!(matches!(err, NetcdfError::DimensionValue { .. }), "input {input:?}");
        }
    }

    #[test]
    fn test_non_interactive_refuses() {
        let err = NonInteractive.length(&open_dim("time")).unwrap_err();
        assert!(err.to_string().contains("time"));
    }
}
