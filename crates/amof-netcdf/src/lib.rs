//! AMOF netCDF file operations.
//!
//! - [`FileBuilder`] writes a new file from a resolved schema.
//! - [`update_variable`] writes data and keeps the valid range current.
//! - [`MetadataMerger`] applies CSV, JSON, YAML or XML metadata.
//! - [`EmptyVariablePruner`] rewrites a file without its unused variables.

pub mod builder;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod native;
pub mod prune;
pub mod updater;

pub use builder::{BuiltFile, DimensionLengthProvider, FileBuilder, NonInteractive, PromptProvider};
pub use error::{NetcdfError, NetcdfResult};
pub use metadata::{parse_metadata, MetadataEntry, MetadataFormat, MetadataMerger, TypeTag};
pub use naming::{FileNameComponents, DEFAULT_PRODUCT_VERSION, MAX_OPTIONS};
pub use native::silence_hdf5_errors;
pub use prune::{rebuild_with_subset, EmptyVariablePruner, STANDARD_DIMENSIONS, STANDARD_VARIABLES};
pub use updater::{
    apply_time_fields, change_qc_flags, find_placeholders, update_variable, update_variable_with,
    UpdateOptions,
};
