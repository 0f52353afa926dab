//! Schema resolution for AMOF netCDF templates.
//!
//! Given an instrument, one or more data products and a deployment mode,
//! [`SchemaResolver`] merges the common vocabulary definition with each
//! product definition into a single [`ResolvedSchema`]: ordered dimensions,
//! deduplicated variables with attribute templates, and global attributes,
//! with every value the vocabulary cannot supply left as a placeholder.

pub mod error;
pub mod resolver;
pub mod schema;

pub use error::{SchemaError, SchemaResult};
pub use resolver::{list_products, SchemaResolver, GENERIC_INSTRUMENT, MOBILE_PLATFORM};
pub use schema::{DimensionSpec, ResolvedSchema, VariableGroup, VariableSpec};
