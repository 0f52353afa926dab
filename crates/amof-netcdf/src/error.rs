//! Error types for netCDF file operations.

use amof_common::{CommonError, DataType};
use thiserror::Error;

/// Result type for netCDF file operations.
pub type NetcdfResult<T> = Result<T, NetcdfError>;

/// Errors raised while building, updating or rewriting a file.
#[derive(Error, Debug)]
pub enum NetcdfError {
    /// A dimension length is missing or not a positive integer. Raised
    /// before any file is created.
    #[error("Invalid length for dimension '{dimension}': {message}")]
    DimensionValue { dimension: String, message: String },

    /// Data for a QC variable contains values outside its flag set. Raised
    /// before anything is written.
    #[error("Invalid data for QC variable '{variable}': {invalid:?} not in flag_values {allowed:?}")]
    QcValue {
        variable: String,
        invalid: Vec<f64>,
        allowed: Vec<i64>,
    },

    #[error("Variable not found in file: {0}")]
    VariableNotFound(String),

    #[error("Data for '{variable}' has {actual} values, expected {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    #[error("Value {value} does not fit type {data_type} of variable '{variable}'")]
    ValueOutOfRange {
        variable: String,
        value: f64,
        data_type: DataType,
    },

    #[error("Unsupported type for variable '{variable}': {message}")]
    UnsupportedType { variable: String, message: String },

    /// A metadata document could not be read or has an unusable entry.
    #[error("Metadata format error: {0}")]
    MetadataFormat(String),

    #[error("Invalid file name component: {0}")]
    FileName(String),

    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl NetcdfError {
    pub(crate) fn dimension(dimension: &str, message: impl Into<String>) -> Self {
        NetcdfError::DimensionValue {
            dimension: dimension.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn metadata(message: impl Into<String>) -> Self {
        NetcdfError::MetadataFormat(message.into())
    }
}
