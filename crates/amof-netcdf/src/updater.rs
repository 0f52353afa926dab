//! Writing data into variables of an existing file.
//!
//! [`update_variable`] is the single write path: it checks QC data against
//! the variable's flag set, converts to the storage type, and keeps
//! `valid_min`/`valid_max` in step with what was written.

use amof_common::{is_placeholder, DataType, QcFlagSet, TimeFields};
use netcdf::{File, FileMut, Variable};
use tracing::{debug, info, warn};

use crate::error::{NetcdfError, NetcdfResult};
use crate::native::{
    attribute_numbers, attribute_text, attribute_value, data_type, fill_value, has_attribute,
    is_fill, target_shape, typed_numbers, untyped_attribute, write_values,
};

/// Time components whose valid range is fixed by the calendar.
const RANGE_EXEMPT: &[&str] = &["year", "month", "day", "hour", "minute", "second", "day_of_year"];

#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    /// Reject QC data outside the flag set. When false the data is written
    /// anyway and a warning is logged.
    pub qc_data_error: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self { qc_data_error: true }
    }
}

/// Write `data` into the named variable with the default options.
pub fn update_variable(file: &mut FileMut, name: &str, data: &[f64]) -> NetcdfResult<()> {
    update_variable_with(file, name, data, UpdateOptions::default())
}

/// Write `data` into the named variable.
///
/// `data` is in row-major order and must fill the variable; a leading
/// unlimited dimension grows to fit. Nothing is written if any check fails.
pub fn update_variable_with(
    file: &mut FileMut,
    name: &str,
    data: &[f64],
    options: UpdateOptions,
) -> NetcdfResult<()> {
    let mut var = file
        .variable_mut(name)
        .ok_or_else(|| NetcdfError::VariableNotFound(name.to_string()))?;
    let dtype = data_type(&var)?;

    let flags = flag_values(&var);
    if let Some(allowed) = &flags {
        let invalid = invalid_qc_values(data, allowed);
        if !invalid.is_empty() {
            if options.qc_data_error {
                return Err(NetcdfError::QcValue {
                    variable: name.to_string(),
                    invalid,
                    allowed: allowed.clone(),
                });
            }
            warn!(variable = %name, invalid = ?invalid, "QC data outside flag_values, writing anyway");
        }
    }

    let shape = target_shape(&var, data.len())?;
    let fill = fill_value(&var, dtype);
    write_values(&mut var, dtype, data, &shape, fill)?;
    debug!(variable = %name, shape = ?shape, "Wrote data");

    if flags.is_none() && !RANGE_EXEMPT.contains(&name) {
        update_valid_range(&mut var, dtype, data, fill)?;
    }
    Ok(())
}

fn flag_values(var: &Variable) -> Option<Vec<i64>> {
    let value = attribute_value(var, "flag_values")?;
    let numbers = attribute_numbers(&value)?;
    Some(numbers.into_iter().map(|v| v as i64).collect())
}

/// Distinct values not in the flag set, in first-seen order.
fn invalid_qc_values(data: &[f64], allowed: &[i64]) -> Vec<f64> {
    let mut invalid: Vec<f64> = Vec::new();
    for &v in data {
        let ok = v.fract() == 0.0 && allowed.contains(&(v as i64));
        if !ok && !invalid.iter().any(|seen| seen == &v || (seen.is_nan() && v.is_nan())) {
            invalid.push(v);
        }
    }
    invalid
}

fn update_valid_range(
    var: &mut netcdf::VariableMut,
    dtype: DataType,
    data: &[f64],
    fill: f64,
) -> NetcdfResult<()> {
    let has_min = has_attribute(var, "valid_min");
    let has_max = has_attribute(var, "valid_max");
    if !has_min && !has_max {
        return Ok(());
    }

    let range = data
        .iter()
        .copied()
        .filter(|v| v.is_finite() && !is_fill(*v, fill, dtype))
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });
    let Some((min, max)) = range else {
        debug!(variable = %var.name(), "No valid data, valid range left unchanged");
        return Ok(());
    };

    if has_min {
        var.put_attribute("valid_min", typed_numbers(&[min], dtype))?;
    }
    if has_max {
        var.put_attribute("valid_max", typed_numbers(&[max], dtype))?;
    }
    debug!(variable = %var.name(), min, max, "Updated valid range");
    Ok(())
}

/// Replace the flag set of an existing variable.
pub fn change_qc_flags(file: &mut FileMut, name: &str, flags: &QcFlagSet) -> NetcdfResult<()> {
    let mut var = file
        .variable_mut(name)
        .ok_or_else(|| NetcdfError::VariableNotFound(name.to_string()))?;
    let dtype = data_type(&var)?;

    if !has_attribute(&var, "flag_values") {
        warn!(variable = %name, "Variable had no flag_values, adding a flag set");
    }
    let values: Vec<f64> = flags.values().iter().map(|v| *v as f64).collect();
    var.put_attribute("flag_values", typed_numbers(&values, dtype))?;
    var.put_attribute("flag_meanings", untyped_attribute(&flags.flag_meanings_attr()))?;

    info!(variable = %name, flags = flags.len(), "Changed QC flags");
    Ok(())
}

/// Write derived time fields into whichever time variables the file has,
/// and set the coverage attributes.
pub fn apply_time_fields(file: &mut FileMut, times: &TimeFields) -> NetcdfResult<()> {
    fn widen<T: Copy + Into<f64>>(values: &[T]) -> Vec<f64> {
        values.iter().map(|v| (*v).into()).collect()
    }

    let columns: [(&str, Vec<f64>); 8] = [
        ("time", times.unix_times.clone()),
        ("year", widen(&times.years)),
        ("month", widen(&times.months)),
        ("day", widen(&times.days)),
        ("hour", widen(&times.hours)),
        ("minute", widen(&times.minutes)),
        ("second", times.seconds.clone()),
        ("day_of_year", times.fractional_day_of_year.clone()),
    ];
    for (name, values) in &columns {
        if file.variable(name).is_some() {
            update_variable(file, name, values)?;
        } else {
            debug!(variable = %name, "Time variable not in file, skipped");
        }
    }

    file.add_attribute("time_coverage_start", times.coverage_start_iso())?;
    file.add_attribute("time_coverage_end", times.coverage_end_iso())?;
    info!(count = times.len(), "Applied time fields");
    Ok(())
}

/// Every attribute still holding a placeholder: `name` for globals,
/// `variable:name` for variable attributes.
pub fn find_placeholders(file: &File) -> Vec<String> {
    let mut found = Vec::new();
    for attr in file.attributes() {
        if holds_placeholder(attr.value().ok()) {
            found.push(attr.name().to_string());
        }
    }
    for var in file.variables() {
        for attr in var.attributes() {
            if holds_placeholder(attr.value().ok()) {
                found.push(format!("{}:{}", var.name(), attr.name()));
            }
        }
    }
    found
}

fn holds_placeholder(value: Option<netcdf::AttributeValue>) -> bool {
    value
        .as_ref()
        .and_then(attribute_text)
        .is_some_and(is_placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_qc_values_distinct() {
        let invalid = invalid_qc_values(&[0.0, 1.0, 5.0, 5.0, 1.5, 2.0], &[0, 1, 2, 3]);
        assert_eq!(invalid, vec![5.0, 1.5]);
    }

    #[test]
    fn test_update_options_default_strict() {
        assert!(UpdateOptions::default().qc_data_error);
    }
}
