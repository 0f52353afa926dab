//! Vocabulary cache keyed by (source, version).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::VocabResult;
use crate::source::{LocalMirror, RemoteRepository, VocabularySource};
use crate::tables::VocabularyTables;

/// Holds loaded vocabulary tables so repeated resolutions in one process
/// do not re-fetch them.
///
/// The store is passed explicitly to whoever needs it; there is no global
/// cache. Entries live until [`VocabularyStore::reload`] or
/// [`VocabularyStore::clear`].
#[derive(Debug, Default)]
pub struct VocabularyStore {
    cache: HashMap<(String, String), Arc<VocabularyTables>>,
}

impl VocabularyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `version` from the remote repository at `source_url`, or from
    /// `use_local_path` when given.
    ///
    /// A local path replaces the network entirely and must mirror the
    /// repository layout (see [`crate::paths`]).
    pub fn load(
        &mut self,
        source_url: &str,
        version: &str,
        use_local_path: Option<&Path>,
    ) -> VocabResult<Arc<VocabularyTables>> {
        let id = source_id(source_url, use_local_path);
        if let Some(tables) = self.cache.get(&(id.clone(), version.to_string())) {
            debug!(source = %id, version = %version, "Vocabulary cache hit");
            return Ok(Arc::clone(tables));
        }
        let source = open_source(source_url, use_local_path)?;
        self.load_from(source, version)
    }

    /// Load `version` from an already constructed source.
    pub fn load_from(
        &mut self,
        source: Arc<dyn VocabularySource>,
        version: &str,
    ) -> VocabResult<Arc<VocabularyTables>> {
        let key = (source.id(), version.to_string());
        if let Some(tables) = self.cache.get(&key) {
            debug!(source = %key.0, version = %version, "Vocabulary cache hit");
            return Ok(Arc::clone(tables));
        }

        let tables = Arc::new(VocabularyTables::load(source, version)?);
        self.cache.insert(key, Arc::clone(&tables));
        Ok(tables)
    }

    /// Evict any cached copy and read the tables again.
    pub fn reload(
        &mut self,
        source_url: &str,
        version: &str,
        use_local_path: Option<&Path>,
    ) -> VocabResult<Arc<VocabularyTables>> {
        let id = source_id(source_url, use_local_path);
        if self.cache.remove(&(id.clone(), version.to_string())).is_some() {
            info!(source = %id, version = %version, "Evicted cached vocabulary");
        }
        self.load(source_url, version, use_local_path)
    }

    pub fn is_cached(&self, source_url: &str, version: &str, use_local_path: Option<&Path>) -> bool {
        self.cache
            .contains_key(&(source_id(source_url, use_local_path), version.to_string()))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Cache key of the source `load` would open; matches `VocabularySource::id`.
fn source_id(source_url: &str, use_local_path: Option<&Path>) -> String {
    match use_local_path {
        Some(path) => path.display().to_string(),
        None => source_url.trim_end_matches('/').to_string(),
    }
}

fn open_source(
    source_url: &str,
    use_local_path: Option<&Path>,
) -> VocabResult<Arc<dyn VocabularySource>> {
    Ok(match use_local_path {
        Some(path) => Arc::new(LocalMirror::new(path)),
        None => Arc::new(RemoteRepository::new(source_url)?),
    })
}
