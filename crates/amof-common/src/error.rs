//! Error types for the shared AMOF types.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised while parsing or validating shared domain values.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Unknown deployment mode: {0} (expected land, sea, air or trajectory)")]
    UnknownDeploymentMode(String),

    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    #[error("Invalid QC flag set: {0}")]
    InvalidFlagSet(String),

    #[error("Invalid flag value '{value}': {message}")]
    InvalidFlagValue { value: String, message: String },

    #[error("No timestamps supplied")]
    EmptyTimes,

    #[error("Incompatible dates: timestamps span years {first} to {last}")]
    YearSpan { first: i32, last: i32 },
}
