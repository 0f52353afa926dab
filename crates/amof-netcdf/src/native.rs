//! Typed access to netCDF variables and attributes.
//!
//! AMOF variables come in seven numeric types, but the rest of the crate
//! works with `f64` data and [`AttrValue`] attributes. These helpers do the
//! conversion at the file boundary: data is read into and written from
//! `f64` in the variable's own storage type, and type-bound attributes
//! (`_FillValue`, `valid_min`, `valid_max`, `flag_values`) are narrowed to
//! that type before they are written.

use std::sync::Once;

use amof_common::{AttrValue, DataType};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::{AttributeValue, Extent, Extents, FileMut, Variable, VariableMut};

use crate::error::{NetcdfError, NetcdfResult};

/// Attributes stored in the owning variable's data type.
pub const TYPE_BOUND_ATTRIBUTES: &[&str] = &["_FillValue", "valid_min", "valid_max", "flag_values"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even for errors the netCDF layer
/// handles, such as probing for an attribute that is not there. Call once
/// early in `main()`; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

// ============================================================================
// Types
// ============================================================================

/// Storage type of a variable.
pub fn data_type(var: &Variable) -> NetcdfResult<DataType> {
    match var.vartype() {
        NcVariableType::Int(IntType::I8) => Ok(DataType::Byte),
        NcVariableType::Int(IntType::U8) => Ok(DataType::UByte),
        NcVariableType::Int(IntType::I16) => Ok(DataType::Short),
        NcVariableType::Int(IntType::I32) => Ok(DataType::Int),
        NcVariableType::Int(IntType::I64) => Ok(DataType::Int64),
        NcVariableType::Float(FloatType::F32) => Ok(DataType::Float),
        NcVariableType::Float(FloatType::F64) => Ok(DataType::Double),
        other => Err(NetcdfError::UnsupportedType {
            variable: var.name(),
            message: format!("{:?}", other),
        }),
    }
}

/// Create a variable of the given storage type.
pub fn add_variable<'f>(
    file: &'f mut FileMut,
    name: &str,
    dimensions: &[&str],
    dtype: DataType,
) -> NetcdfResult<VariableMut<'f>> {
    let var = match dtype {
        DataType::Byte => file.add_variable::<i8>(name, dimensions)?,
        DataType::UByte => file.add_variable::<u8>(name, dimensions)?,
        DataType::Short => file.add_variable::<i16>(name, dimensions)?,
        DataType::Int => file.add_variable::<i32>(name, dimensions)?,
        DataType::Int64 => file.add_variable::<i64>(name, dimensions)?,
        DataType::Float => file.add_variable::<f32>(name, dimensions)?,
        DataType::Double => file.add_variable::<f64>(name, dimensions)?,
    };
    Ok(var)
}

// ============================================================================
// Attributes
// ============================================================================

/// Whether the variable has an attribute, checked without provoking an
/// HDF5 lookup error.
pub fn has_attribute(var: &Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Raw value of a variable attribute, if present and readable.
pub fn attribute_value(var: &Variable, name: &str) -> Option<AttributeValue> {
    if !has_attribute(var, name) {
        return None;
    }
    var.attribute_value(name)?.ok()
}

/// Numeric content of an attribute value, widened to f64.
pub fn attribute_numbers(value: &AttributeValue) -> Option<Vec<f64>> {
    fn widen<T: Copy + Into<f64>>(values: &[T]) -> Vec<f64> {
        values.iter().map(|v| (*v).into()).collect()
    }
    Some(match value {
        AttributeValue::Schar(v) => vec![*v as f64],
        AttributeValue::Schars(v) => widen(v),
        AttributeValue::Uchar(v) => vec![*v as f64],
        AttributeValue::Uchars(v) => widen(v),
        AttributeValue::Short(v) => vec![*v as f64],
        AttributeValue::Shorts(v) => widen(v),
        AttributeValue::Ushort(v) => vec![*v as f64],
        AttributeValue::Ushorts(v) => widen(v),
        AttributeValue::Int(v) => vec![*v as f64],
        AttributeValue::Ints(v) => widen(v),
        AttributeValue::Uint(v) => vec![*v as f64],
        AttributeValue::Uints(v) => widen(v),
        AttributeValue::Longlong(v) => vec![*v as f64],
        AttributeValue::Longlongs(v) => v.iter().map(|x| *x as f64).collect(),
        AttributeValue::Ulonglong(v) => vec![*v as f64],
        AttributeValue::Ulonglongs(v) => v.iter().map(|x| *x as f64).collect(),
        AttributeValue::Float(v) => vec![*v as f64],
        AttributeValue::Floats(v) => widen(v),
        AttributeValue::Double(v) => vec![*v],
        AttributeValue::Doubles(v) => v.clone(),
        _ => return None,
    })
}

/// Text content of an attribute value.
pub fn attribute_text(value: &AttributeValue) -> Option<&str> {
    match value {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Convert a netCDF attribute value into the crate's attribute model.
pub fn to_attr_value(value: &AttributeValue) -> Option<AttrValue> {
    if let Some(text) = attribute_text(value) {
        return Some(AttrValue::Text(text.to_string()));
    }
    let numbers = attribute_numbers(value)?;
    let integer = !matches!(
        value,
        AttributeValue::Float(_)
            | AttributeValue::Floats(_)
            | AttributeValue::Double(_)
            | AttributeValue::Doubles(_)
    );
    Some(match (integer, numbers.as_slice()) {
        (true, [single]) => AttrValue::Int(*single as i64),
        (true, _) => AttrValue::Ints(numbers.iter().map(|v| *v as i64).collect()),
        (false, [single]) => AttrValue::Float(*single),
        (false, _) => AttrValue::Floats(numbers),
    })
}

/// Fill value of a variable: its `_FillValue` attribute, else the netCDF
/// default for its type.
pub fn fill_value(var: &Variable, dtype: DataType) -> f64 {
    attribute_value(var, "_FillValue")
        .as_ref()
        .and_then(attribute_numbers)
        .and_then(|v| v.first().copied())
        .unwrap_or_else(|| dtype.default_fill())
}

/// Whether a value equals the fill value once stored in `dtype`. NaN counts
/// as fill for floating-point types.
pub fn is_fill(value: f64, fill: f64, dtype: DataType) -> bool {
    match dtype {
        DataType::Float | DataType::Double if value.is_nan() => true,
        DataType::Float => value as f32 == fill as f32,
        _ => value == fill,
    }
}

/// Numbers narrowed to a storage type, as a scalar or array attribute.
pub fn typed_numbers(values: &[f64], dtype: DataType) -> AttributeValue {
    macro_rules! narrow {
        ($t:ty, $one:ident, $many:ident) => {
            match values {
                [single] => AttributeValue::$one(*single as $t),
                _ => AttributeValue::$many(values.iter().map(|v| *v as $t).collect()),
            }
        };
    }
    match dtype {
        DataType::Byte => narrow!(i8, Schar, Schars),
        DataType::UByte => narrow!(u8, Uchar, Uchars),
        DataType::Short => narrow!(i16, Short, Shorts),
        DataType::Int => narrow!(i32, Int, Ints),
        DataType::Int64 => narrow!(i64, Longlong, Longlongs),
        DataType::Float => narrow!(f32, Float, Floats),
        DataType::Double => narrow!(f64, Double, Doubles),
    }
}

/// netCDF value for an attribute, narrowed to `dtype` when the attribute is
/// type-bound and numeric.
pub fn attribute_for(name: &str, value: &AttrValue, dtype: DataType) -> AttributeValue {
    match value.as_f64s() {
        Some(numbers) if TYPE_BOUND_ATTRIBUTES.contains(&name) => typed_numbers(&numbers, dtype),
        _ => untyped_attribute(value),
    }
}

/// netCDF value for an attribute with no owning type (global attributes
/// and free-form variable attributes).
pub fn untyped_attribute(value: &AttrValue) -> AttributeValue {
    let fits_i32 = |v: &i64| i32::try_from(*v).is_ok();
    match value {
        AttrValue::Text(s) => AttributeValue::Str(s.clone()),
        AttrValue::Int(v) if fits_i32(v) => AttributeValue::Int(*v as i32),
        AttrValue::Int(v) => AttributeValue::Longlong(*v),
        AttrValue::Ints(v) if v.iter().all(fits_i32) => {
            AttributeValue::Ints(v.iter().map(|x| *x as i32).collect())
        }
        AttrValue::Ints(v) => AttributeValue::Longlongs(v.clone()),
        AttrValue::Float(v) => AttributeValue::Double(*v),
        AttrValue::Floats(v) => AttributeValue::Doubles(v.clone()),
    }
}

// ============================================================================
// Data
// ============================================================================

/// Current dimension lengths of a variable.
pub fn current_shape(var: &Variable) -> Vec<usize> {
    var.dimensions().iter().map(|d| d.len()).collect()
}

/// Shape the data will have once written. A leading unlimited dimension
/// grows (or shrinks) to fit `len` values; otherwise `len` must match the
/// current element count.
pub fn target_shape(var: &Variable, len: usize) -> NetcdfResult<Vec<usize>> {
    let dims = var.dimensions();
    let mut shape = current_shape(var);

    if let Some(first) = dims.first().filter(|d| d.is_unlimited()) {
        let inner: usize = shape[1..].iter().product();
        if inner == 0 || len % inner != 0 {
            return Err(NetcdfError::ShapeMismatch {
                variable: var.name(),
                expected: inner.max(1) * first.len(),
                actual: len,
            });
        }
        shape[0] = len / inner;
        return Ok(shape);
    }

    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(NetcdfError::ShapeMismatch {
            variable: var.name(),
            expected,
            actual: len,
        });
    }
    Ok(shape)
}

fn extents(shape: &[usize]) -> Extents {
    let extents: Vec<Extent> = shape.iter().map(|&n| Extent::from(0..n)).collect();
    extents.into()
}

/// Read all data of a variable, widened to f64.
pub fn read_values(var: &Variable, dtype: DataType) -> NetcdfResult<Vec<f64>> {
    if current_shape(var).contains(&0) {
        return Ok(Vec::new());
    }
    macro_rules! read_as {
        ($t:ty) => {
            var.get_values::<$t, _>(..)?
                .into_iter()
                .map(|v| v as f64)
                .collect()
        };
    }
    Ok(match dtype {
        DataType::Byte => read_as!(i8),
        DataType::UByte => read_as!(u8),
        DataType::Short => read_as!(i16),
        DataType::Int => read_as!(i32),
        DataType::Int64 => read_as!(i64),
        DataType::Float => read_as!(f32),
        DataType::Double => read_as!(f64),
    })
}

/// Write `data` into a variable with the given shape, converted to the
/// variable's type. NaN becomes `fill` for integer types; integer values
/// outside the type's range are rejected before anything is written.
pub fn write_values(
    var: &mut VariableMut,
    dtype: DataType,
    data: &[f64],
    shape: &[usize],
    fill: f64,
) -> NetcdfResult<()> {
    let values: Vec<f64> = if dtype.is_integer() {
        data.iter()
            .map(|&v| {
                let v = if v.is_nan() { fill } else { v };
                if !dtype.can_hold(v) {
                    Err(NetcdfError::ValueOutOfRange {
                        variable: var.name(),
                        value: v,
                        data_type: dtype,
                    })
                } else {
                    Ok(v)
                }
            })
            .collect::<NetcdfResult<_>>()?
    } else {
        data.to_vec()
    };

    if shape.contains(&0) {
        return Ok(());
    }
    let extents = extents(shape);

    macro_rules! write_as {
        ($t:ty) => {{
            let typed: Vec<$t> = values.iter().map(|v| *v as $t).collect();
            var.put_values(&typed, extents)?
        }};
    }
    match dtype {
        DataType::Byte => write_as!(i8),
        DataType::UByte => write_as!(u8),
        DataType::Short => write_as!(i16),
        DataType::Int => write_as!(i32),
        DataType::Int64 => write_as!(i64),
        DataType::Float => write_as!(f32),
        DataType::Double => write_as!(f64),
    }
    Ok(())
}

/// Copy all data of `src` into `dst` without widening. Both variables must
/// have the same type and shape.
pub fn copy_values(src: &Variable, dst: &mut VariableMut, dtype: DataType) -> NetcdfResult<()> {
    let shape = current_shape(src);
    if shape.contains(&0) {
        return Ok(());
    }
    macro_rules! copy_as {
        ($t:ty) => {{
            let values = src.get_values::<$t, _>(..)?;
            dst.put_values(&values, extents(&shape))?
        }};
    }
    match dtype {
        DataType::Byte => copy_as!(i8),
        DataType::UByte => copy_as!(u8),
        DataType::Short => copy_as!(i16),
        DataType::Int => copy_as!(i32),
        DataType::Int64 => copy_as!(i64),
        DataType::Float => copy_as!(f32),
        DataType::Double => copy_as!(f64),
    }
    Ok(())
}
