//! Error types for schema resolution.

use amof_common::DeploymentMode;
use amof_vocab::VocabError;
use thiserror::Error;

/// Result type for schema resolution.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while resolving a schema. No file has been touched when
/// any of these is returned.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Instrument not found in vocabulary: {0}")]
    InstrumentNotFound(String),

    #[error("Product '{product}' has no definition for deployment mode '{mode}'")]
    ProductNotFound {
        product: String,
        mode: DeploymentMode,
    },

    #[error("At least one data product is required")]
    NoProducts,

    #[error("Vocabulary error: {0}")]
    Vocab(#[from] VocabError),
}
