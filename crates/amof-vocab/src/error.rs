//! Error types for vocabulary loading.

use thiserror::Error;

/// Result type for vocabulary operations.
pub type VocabResult<T> = Result<T, VocabError>;

/// Errors that can occur while fetching or parsing vocabulary tables.
#[derive(Error, Debug)]
pub enum VocabError {
    /// A table is missing from the source. For a local mirror this usually
    /// means the directory does not follow the repository layout.
    #[error("Vocabulary table not found: {path}")]
    Lookup { path: String },

    /// The source could not deliver a table (I/O, network, HTTP status).
    #[error("Failed to fetch vocabulary table {path}: {message}")]
    DataSource { path: String, message: String },

    /// A table was fetched but its content is malformed.
    #[error("Malformed vocabulary table {path}: {message}")]
    Parse { path: String, message: String },
}

impl VocabError {
    pub(crate) fn parse(path: &str, message: impl Into<String>) -> Self {
        VocabError::Parse {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// True for a missing table, as opposed to a failed or malformed fetch.
    pub fn is_lookup(&self) -> bool {
        matches!(self, VocabError::Lookup { .. })
    }
}
