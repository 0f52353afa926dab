//! Parsed vocabulary tables for one (source, version).
//!
//! The small tables (global attributes, instruments, data products) are read
//! when the tables are loaded. Common and product definitions are read the
//! first time they are asked for and kept for the lifetime of the tables, so
//! resolving a single product never fetches the other fifty.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use amof_common::DeploymentMode;
use tracing::{debug, info, warn};

use crate::defs::{
    CommonDefinition, GlobalAttributeDef, InstrumentDef, KeyedTable, ProductDefinition,
    ProductEntry,
};
use crate::error::VocabResult;
use crate::paths;
use crate::source::VocabularySource;
use crate::tsv;

type ProductKey = (String, DeploymentMode);

/// Read-only view of a vocabulary version.
pub struct VocabularyTables {
    version: String,
    source: Arc<dyn VocabularySource>,
    global_attributes: KeyedTable<GlobalAttributeDef>,
    instruments: KeyedTable<InstrumentDef>,
    products: KeyedTable<ProductEntry>,
    common: Mutex<HashMap<DeploymentMode, Arc<CommonDefinition>>>,
    product_defs: Mutex<HashMap<ProductKey, Option<Arc<ProductDefinition>>>>,
}

impl std::fmt::Debug for VocabularyTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocabularyTables")
            .field("source", &self.source.id())
            .field("version", &self.version)
            .field("instruments", &self.instruments.len())
            .field("products", &self.products.len())
            .finish()
    }
}

impl VocabularyTables {
    /// Load the eagerly-read tables of `version` from `source`.
    ///
    /// The NCAS instrument vocabulary is required; the community vocabulary
    /// is merged in after it when present (NCAS rows win on a clash).
    pub fn load(source: Arc<dyn VocabularySource>, version: &str) -> VocabResult<Self> {
        info!(source = %source.id(), version = %version, "Loading vocabulary tables");

        let path = paths::common_global_attributes(version);
        let global_attributes = keyed(
            &path,
            tsv::parse_global_attributes(&path, &source.fetch(&path)?)?,
            |a| &a.name,
        );

        let path = paths::instrument_vocab(version, paths::NCAS_INSTRUMENTS);
        let mut instrument_rows = tsv::parse_instruments(&path, &source.fetch(&path)?)?;
        let community = paths::instrument_vocab(version, paths::COMMUNITY_INSTRUMENTS);
        match source.fetch_optional(&community)? {
            Some(text) => instrument_rows.extend(tsv::parse_instruments(&community, &text)?),
            None => debug!(path = %community, "No community instrument vocabulary"),
        }
        let instruments = keyed(&path, instrument_rows, |i| &i.id);

        let path = paths::data_products(version);
        let products = keyed(
            &path,
            tsv::parse_products(&path, &source.fetch(&path)?)?,
            |p| &p.name,
        );

        debug!(
            global_attributes = global_attributes.len(),
            instruments = instruments.len(),
            products = products.len(),
            "Vocabulary tables loaded"
        );

        Ok(Self {
            version: version.to_string(),
            source,
            global_attributes,
            instruments,
            products,
            common: Mutex::new(HashMap::new()),
            product_defs: Mutex::new(HashMap::new()),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Identifier of the source the tables were read from.
    pub fn source_id(&self) -> String {
        self.source.id()
    }

    /// Rows of the common global attribute table, in file order.
    pub fn global_attributes(&self) -> impl Iterator<Item = &GlobalAttributeDef> {
        self.global_attributes.iter()
    }

    pub fn instrument(&self, id: &str) -> Option<&InstrumentDef> {
        self.instruments.get(id)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentDef> {
        self.instruments.iter()
    }

    /// Entries of the data product list, in file order.
    pub fn products(&self) -> impl Iterator<Item = &ProductEntry> {
        self.products.iter()
    }

    pub fn product_names(&self) -> Vec<String> {
        self.products.iter().map(|p| p.name.clone()).collect()
    }

    /// Common dimensions and variables for a deployment mode.
    pub fn common(&self, mode: DeploymentMode) -> VocabResult<Arc<CommonDefinition>> {
        if let Some(def) = lock(&self.common).get(&mode) {
            debug!(mode = %mode, "Common definition cache hit");
            return Ok(Arc::clone(def));
        }

        let dims_path = paths::common_dimensions(&self.version, mode);
        let vars_path = paths::common_variables(&self.version, mode);
        let def = Arc::new(CommonDefinition {
            dimensions: tsv::parse_dimensions(&dims_path, &self.source.fetch(&dims_path)?)?,
            variables: tsv::parse_variables(&vars_path, &self.source.fetch(&vars_path)?)?,
        });

        lock(&self.common).insert(mode, Arc::clone(&def));
        Ok(def)
    }

    /// Product-specific definition for a deployment mode.
    ///
    /// Returns `Ok(None)` when the product has no variable table for the
    /// mode (neither the mode-specific nor the generic one). Dimension and
    /// global attribute tables are optional.
    pub fn product(
        &self,
        name: &str,
        mode: DeploymentMode,
    ) -> VocabResult<Option<Arc<ProductDefinition>>> {
        let key = (name.to_string(), mode);
        if let Some(def) = lock(&self.product_defs).get(&key) {
            debug!(product = %name, mode = %mode, "Product definition cache hit");
            return Ok(def.clone());
        }

        let def = self.load_product(name, mode)?.map(Arc::new);
        lock(&self.product_defs).insert(key, def.clone());
        Ok(def)
    }

    fn load_product(
        &self,
        name: &str,
        mode: DeploymentMode,
    ) -> VocabResult<Option<ProductDefinition>> {
        let mode_path = paths::product_mode_variables(&self.version, name, mode);
        let generic_path = paths::product_variables(&self.version, name);

        let (vars_path, vars_text) = match self.source.fetch_optional(&mode_path)? {
            Some(text) => (mode_path, text),
            None => match self.source.fetch_optional(&generic_path)? {
                Some(text) => (generic_path, text),
                None => {
                    debug!(product = %name, mode = %mode, "No variable table for product");
                    return Ok(None);
                }
            },
        };
        let variables = tsv::parse_variables(&vars_path, &vars_text)?;

        let dims_path = paths::product_dimensions(&self.version, name);
        let dimensions = match self.source.fetch_optional(&dims_path)? {
            Some(text) => tsv::parse_dimensions(&dims_path, &text)?,
            None => Vec::new(),
        };

        let attrs_path = paths::product_global_attributes(&self.version, name);
        let global_attributes = match self.source.fetch_optional(&attrs_path)? {
            Some(text) => tsv::parse_global_attributes(&attrs_path, &text)?,
            None => Vec::new(),
        };

        debug!(
            product = %name,
            mode = %mode,
            dimensions = dimensions.len(),
            variables = variables.len(),
            "Loaded product definition"
        );

        Ok(Some(ProductDefinition {
            name: name.to_string(),
            dimensions,
            variables,
            global_attributes,
        }))
    }
}

fn keyed<T>(path: &str, rows: Vec<T>, key: impl Fn(&T) -> &str) -> KeyedTable<T> {
    let (table, duplicates) = KeyedTable::from_rows(rows, key);
    if !duplicates.is_empty() {
        warn!(path = %path, duplicates = ?duplicates, "Duplicate rows ignored, first definition kept");
    }
    table
}

/// The guarded maps are only ever inserted into, so a poisoned lock still
/// holds consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
