//! Removing variables that were never written.
//!
//! A template carries every variable its products define, but a given
//! deployment often fills only some of them. [`EmptyVariablePruner`] drops
//! the ones still entirely at their fill value. netCDF cannot delete a
//! variable in place, so the file is rebuilt with the retained subset and
//! renamed over the original.

use std::collections::HashSet;
use std::path::Path;

use amof_schema::ResolvedSchema;
use netcdf::{File, FileMut};
use tracing::{debug, info};

use crate::error::NetcdfResult;
use crate::native::{add_variable, copy_values, data_type, fill_value, is_fill, read_values};

/// Time and location variables every AMOF file keeps.
pub const STANDARD_VARIABLES: &[&str] = &[
    "time",
    "latitude",
    "longitude",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "day_of_year",
];

/// Dimensions every AMOF file keeps.
pub const STANDARD_DIMENSIONS: &[&str] = &["time", "latitude", "longitude"];

#[derive(Debug, Clone)]
pub struct EmptyVariablePruner {
    protected_variables: HashSet<String>,
    protected_dimensions: HashSet<String>,
}

impl EmptyVariablePruner {
    pub fn new<V, D>(variables: V, dimensions: D) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            protected_variables: variables.into_iter().map(Into::into).collect(),
            protected_dimensions: dimensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Protect the common variables and dimensions of a schema.
    pub fn from_schema(schema: &ResolvedSchema) -> Self {
        Self::new(schema.common_variable_names(), schema.common_dimension_names())
    }

    /// Protect the standard AMOF time and location set.
    pub fn standard() -> Self {
        Self::new(
            STANDARD_VARIABLES.iter().copied(),
            STANDARD_DIMENSIONS.iter().copied(),
        )
    }

    /// Remove every unprotected variable whose data is all fill from the
    /// closed file at `path`. Returns the removed names in file order.
    pub fn prune(&self, path: &Path) -> NetcdfResult<Vec<String>> {
        let src = netcdf::open(path)?;

        let mut removed = Vec::new();
        let mut retained = Vec::new();
        for var in src.variables() {
            let name = var.name();
            if self.protected_variables.contains(&name) || !is_empty(&var)? {
                retained.push(name);
            } else {
                debug!(variable = %name, "Variable holds only fill values");
                removed.push(name);
            }
        }
        if removed.is_empty() {
            debug!(path = ?path, "Nothing to prune");
            return Ok(removed);
        }

        let mut dimensions: HashSet<String> = self.protected_dimensions.clone();
        for name in &retained {
            if let Some(var) = src.variable(name) {
                dimensions.extend(var.dimensions().iter().map(|d| d.name()));
            }
        }

        rebuild_with_subset(src, path, &retained, &dimensions)?;
        info!(path = ?path, removed = ?removed, "Pruned empty variables");
        Ok(removed)
    }
}

fn is_empty(var: &netcdf::Variable) -> NetcdfResult<bool> {
    let dtype = data_type(var)?;
    let fill = fill_value(var, dtype);
    Ok(read_values(var, dtype)?
        .into_iter()
        .all(|v| is_fill(v, fill, dtype)))
}

/// Rewrite `path` so it contains only `variables` and `dimensions`, with
/// all attributes and data of what remains. The copy goes to a sibling
/// temporary file that replaces the original only once complete.
pub fn rebuild_with_subset(
    src: File,
    path: &Path,
    variables: &[String],
    dimensions: &HashSet<String>,
) -> NetcdfResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".prune-")
        .suffix(".nc")
        .tempfile_in(dir)?;

    {
        let mut dst = netcdf::create(tmp.path())?;
        copy_subset(&src, &mut dst, variables, dimensions)?;
    }
    drop(src);

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn copy_subset(
    src: &File,
    dst: &mut FileMut,
    variables: &[String],
    dimensions: &HashSet<String>,
) -> NetcdfResult<()> {
    for dim in src.dimensions() {
        let name = dim.name();
        if !dimensions.contains(&name) {
            continue;
        }
        if dim.is_unlimited() {
            dst.add_unlimited_dimension(&name)?;
        } else {
            dst.add_dimension(&name, dim.len())?;
        }
    }

    for attr in src.attributes() {
        dst.add_attribute(attr.name(), attr.value()?)?;
    }

    for name in variables {
        let Some(var) = src.variable(name) else {
            continue;
        };
        let dtype = data_type(&var)?;
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let dims: Vec<&str> = dims.iter().map(String::as_str).collect();

        let mut out = add_variable(dst, name, &dims, dtype)?;
        let attrs: Vec<_> = var.attributes().collect();
        for attr in attrs.iter().filter(|a| a.name() == "_FillValue") {
            out.put_attribute(attr.name(), attr.value()?)?;
        }
        for attr in attrs.iter().filter(|a| a.name() != "_FillValue") {
            out.put_attribute(attr.name(), attr.value()?)?;
        }
        copy_values(&var, &mut out, dtype)?;
    }
    Ok(())
}
