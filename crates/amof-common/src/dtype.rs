//! netCDF numeric data types used by AMOF variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CommonError;

/// Storage type of a variable, as declared by the vocabulary `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Signed 8-bit integer (`byte`, `int8`). Used for QC flags.
    Byte,
    /// Unsigned 8-bit integer
    UByte,
    /// Signed 16-bit integer
    Short,
    /// Signed 32-bit integer
    Int,
    /// Signed 64-bit integer
    Int64,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
}

impl DataType {
    /// Canonical vocabulary spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Byte => "byte",
            DataType::UByte => "ubyte",
            DataType::Short => "short",
            DataType::Int => "int",
            DataType::Int64 => "int64",
            DataType::Float => "float32",
            DataType::Double => "float64",
        }
    }

    /// netCDF default fill value for the type (`NC_FILL_*`).
    pub fn default_fill(&self) -> f64 {
        match self {
            DataType::Byte => -127.0,
            DataType::UByte => 255.0,
            DataType::Short => -32767.0,
            DataType::Int => -2147483647.0,
            DataType::Int64 => -9223372036854775806.0,
            DataType::Float => 9.969_209_968_386_869e36_f32 as f64,
            DataType::Double => 9.969_209_968_386_869e36,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, DataType::Float | DataType::Double)
    }

    /// Inclusive value range representable by the type.
    pub fn range(&self) -> (f64, f64) {
        match self {
            DataType::Byte => (i8::MIN as f64, i8::MAX as f64),
            DataType::UByte => (u8::MIN as f64, u8::MAX as f64),
            DataType::Short => (i16::MIN as f64, i16::MAX as f64),
            DataType::Int => (i32::MIN as f64, i32::MAX as f64),
            DataType::Int64 => (i64::MIN as f64, i64::MAX as f64),
            DataType::Float => (f32::MIN as f64, f32::MAX as f64),
            DataType::Double => (f64::MIN, f64::MAX),
        }
    }

    /// Whether `value` converts to the type without saturating.
    ///
    /// `i64::MAX as f64` rounds up to 2^63, which is itself out of range, so
    /// the 64-bit upper bound is exclusive.
    pub fn can_hold(&self, value: f64) -> bool {
        let (min, max) = self.range();
        match self {
            DataType::Int64 => value >= min && value < max,
            _ => value >= min && value <= max,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "byte" | "int8" | "i8" | "b" => Ok(DataType::Byte),
            "ubyte" | "uint8" | "u8" => Ok(DataType::UByte),
            "short" | "int16" | "i16" => Ok(DataType::Short),
            "int" | "int32" | "i32" | "integer" => Ok(DataType::Int),
            "int64" | "i64" | "long" => Ok(DataType::Int64),
            "float" | "float32" | "f4" | "f32" | "real" => Ok(DataType::Float),
            "double" | "float64" | "f8" | "f64" => Ok(DataType::Double),
            _ => Err(CommonError::UnknownDataType(s.to_string())),
        }
    }
}
