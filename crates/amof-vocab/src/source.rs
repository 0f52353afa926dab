//! Where vocabulary tables come from.
//!
//! Two sources are provided: [`LocalMirror`] for offline use, reading a
//! directory that mirrors the repository layout, and [`RemoteRepository`],
//! fetching raw files over HTTP. Neither retries; re-running against a
//! local mirror is the way to work around an unreliable network.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{VocabError, VocabResult};

/// Default remote repository holding the AMOF vocabularies.
pub const DEFAULT_VOCAB_URL: &str = "https://raw.githubusercontent.com/ncasuk/AMF_CVs";

/// A provider of raw vocabulary table text.
pub trait VocabularySource: Send + Sync {
    /// Stable identifier used as the cache key (path or base URL).
    fn id(&self) -> String;

    /// Fetch the table at `relative` (see [`crate::paths`]).
    fn fetch(&self, relative: &str) -> VocabResult<String>;

    /// Fetch a table that may legitimately be absent.
    fn fetch_optional(&self, relative: &str) -> VocabResult<Option<String>> {
        match self.fetch(relative) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.is_lookup() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Local mirror
// ============================================================================

/// Vocabulary tables read from a local directory.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    root: PathBuf,
}

impl LocalMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VocabularySource for LocalMirror {
    fn id(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch(&self, relative: &str) -> VocabResult<String> {
        let path = self.root.join(relative);
        debug!(path = ?path, "Reading vocabulary table");
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VocabError::Lookup {
                path: path.display().to_string(),
            },
            _ => VocabError::DataSource {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })
    }
}

// ============================================================================
// Remote repository
// ============================================================================

/// Vocabulary tables fetched from a raw-file HTTP endpoint.
#[derive(Debug, Clone)]
pub struct RemoteRepository {
    base_url: String,
    client: Client,
}

impl RemoteRepository {
    /// Create a source rooted at `base_url`; tables are fetched from
    /// `{base_url}/{relative}`.
    pub fn new(base_url: impl Into<String>) -> VocabResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("amof-template/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VocabError::DataSource {
                path: base_url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative.trim_start_matches('/'))
    }
}

impl VocabularySource for RemoteRepository {
    fn id(&self) -> String {
        self.base_url.clone()
    }

    fn fetch(&self, relative: &str) -> VocabResult<String> {
        let url = self.url(relative);
        debug!(url = %url, "Fetching vocabulary table");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| VocabError::DataSource {
                path: url.clone(),
                message: e.to_string(),
            })?;

        match response.status() {
            status if status.is_success() => response.text().map_err(|e| VocabError::DataSource {
                path: url.clone(),
                message: e.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(VocabError::Lookup { path: url }),
            status => Err(VocabError::DataSource {
                path: url,
                message: format!("HTTP status {}", status),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_mirror_reads_relative_path() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("v1/a")).unwrap();
        fs::write(dir.path().join("v1/a/t.tsv"), "Name\nx\n").unwrap();

        let mirror = LocalMirror::new(dir.path());
        assert_eq!(mirror.fetch("v1/a/t.tsv").unwrap(), "Name\nx\n");
    }

    #[test]
    fn test_local_mirror_missing_is_lookup_error() {
        let dir = tempdir().unwrap();
        let mirror = LocalMirror::new(dir.path());

        let err = mirror.fetch("v1/missing.tsv").unwrap_err();
        match &err {
            VocabError::Lookup { path } => assert!(path.ends_with("missing.tsv")),
            other => panic!("Expected lookup error, got {other:?}"),
        }
        assert!(mirror.fetch_optional("v1/missing.tsv").unwrap().is_none());
    }

    #[test]
    fn test_remote_url_joining() {
        let remote = RemoteRepository::new("https://example.org/cvs/").unwrap();
        assert_eq!(remote.base_url(), "https://example.org/cvs");
        assert_eq!(
            remote.url("/v2.0.0/product-definitions/tsv/_common/global-attributes.tsv"),
            "https://example.org/cvs/v2.0.0/product-definitions/tsv/_common/global-attributes.tsv"
        );
    }
}
