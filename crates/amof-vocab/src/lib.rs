//! Controlled-vocabulary tables for AMOF netCDF templates.
//!
//! The vocabularies live in a versioned repository of tab-separated tables
//! (instruments, data products, common and product-specific dimensions,
//! variables and global attributes). This crate fetches them from the
//! remote repository or a local mirror, parses them into typed rows and
//! caches them per (source, version).
//!
//! ```ignore
//! let mut store = VocabularyStore::new();
//! let tables = store.load(DEFAULT_VOCAB_URL, "v2.0.0", Some(Path::new("/data/AMF_CVs")))?;
//! let common = tables.common(DeploymentMode::Land)?;
//! ```

pub mod defs;
pub mod error;
pub mod paths;
pub mod source;
pub mod store;
pub mod tables;
pub mod tsv;

pub use defs::{
    CommonDefinition, DimensionDef, GlobalAttributeDef, InstrumentDef, KeyedTable,
    ProductDefinition, ProductEntry, VariableDef,
};
pub use error::{VocabError, VocabResult};
pub use source::{LocalMirror, RemoteRepository, VocabularySource, DEFAULT_VOCAB_URL};
pub use store::VocabularyStore;
pub use tables::VocabularyTables;
