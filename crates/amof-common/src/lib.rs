//! Common types and utilities shared across the AMOF template crates.

pub mod attr;
pub mod dim;
pub mod dtype;
pub mod error;
pub mod mode;
pub mod placeholder;
pub mod qc;
pub mod time;

pub use attr::AttrValue;
pub use dim::DimensionLength;
pub use dtype::DataType;
pub use error::{CommonError, CommonResult};
pub use mode::DeploymentMode;
pub use placeholder::{is_placeholder, PLACEHOLDER_PREFIX};
pub use qc::{QcFlag, QcFlagSet};
pub use time::{get_times, TimeFields};
