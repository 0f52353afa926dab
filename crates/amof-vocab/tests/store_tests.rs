//! Loading and caching the synthetic vocabulary tree through a local mirror.

use amof_common::{DeploymentMode, DimensionLength};
use amof_vocab::{VocabError, VocabularyStore, DEFAULT_VOCAB_URL};
use test_utils::*;

#[test]
fn test_load_local_mirror() {
    let fixture = VocabFixture::new();
    let mut store = VocabularyStore::new();

    let tables = store
        .load(DEFAULT_VOCAB_URL, VERSION, Some(fixture.root()))
        .unwrap();

    assert_eq!(tables.version(), VERSION);
    assert_eq!(
        tables.product_names(),
        vec![PRODUCT_BACKSCATTER, PRODUCT_CLOUD_BASE, PRODUCT_UNDEFINED]
    );
    assert_eq!(tables.global_attributes().next().unwrap().name, "Conventions");

    let instrument = tables.instrument(FIXED_INSTRUMENT).unwrap();
    assert_eq!(instrument.manufacturer, "Lufft");
    assert_eq!(instrument.default_platform.as_deref(), Some(FIXED_INSTRUMENT_SITE));
}

#[test]
fn test_community_instruments_merged_ncas_first() {
    let fixture = VocabFixture::new();
    let mut store = VocabularyStore::new();
    let tables = store
        .load(DEFAULT_VOCAB_URL, VERSION, Some(fixture.root()))
        .unwrap();

    assert!(tables.instrument(COMMUNITY_INSTRUMENT).is_some());
    assert_eq!(tables.instruments().count(), 3);
    // The community row repeating an NCAS id is ignored
    assert_eq!(tables.instrument(FIXED_INSTRUMENT).unwrap().manufacturer, "Lufft");
}

#[test]
fn test_community_vocabulary_is_optional() {
    let fixture = VocabFixture::new();
    fixture.remove("_instrument_vocabs/community-instrument-name-and-descriptors.tsv");

    let mut store = VocabularyStore::new();
    let tables = store
        .load(DEFAULT_VOCAB_URL, VERSION, Some(fixture.root()))
        .unwrap();
    assert_eq!(tables.instruments().count(), 2);
}

#[test]
fn test_cache_per_source_and_version() {
    let fixture = VocabFixture::new();
    let mut store = VocabularyStore::new();
    let root = Some(fixture.root());

    assert!(!store.is_cached(DEFAULT_VOCAB_URL, VERSION, root));
    let first = store.load(DEFAULT_VOCAB_URL, VERSION, root).unwrap();
    assert!(store.is_cached(DEFAULT_VOCAB_URL, VERSION, root));

    // Removing a table after loading does not affect the cached copy
    fixture.remove("_vocabularies/data-products.tsv");
    let second = store.load(DEFAULT_VOCAB_URL, VERSION, root).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(store.len(), 1);

    // A reload re-reads and surfaces the missing table
    let err = store.reload(DEFAULT_VOCAB_URL, VERSION, root).unwrap_err();
    assert!(err.is_lookup());
    assert!(!store.is_cached(DEFAULT_VOCAB_URL, VERSION, root));
}

#[test]
fn test_missing_version_names_path() {
    let fixture = VocabFixture::new();
    let mut store = VocabularyStore::new();

    let err = store
        .load(DEFAULT_VOCAB_URL, "v0.0.1", Some(fixture.root()))
        .unwrap_err();
    match err {
        VocabError::Lookup { path } => {
            assert!(path.contains("v0.0.1"));
            assert!(path.ends_with("global-attributes.tsv"));
        }
        other => panic!("Expected lookup error, got {other:?}"),
    }
    assert!(store.is_empty());
}

#[test]
fn test_common_and_product_definitions() {
    let fixture = VocabFixture::new();
    let mut store = VocabularyStore::new();
    let tables = store
        .load(DEFAULT_VOCAB_URL, VERSION, Some(fixture.root()))
        .unwrap();

    let land = tables.common(DeploymentMode::Land).unwrap();
    assert_eq!(land.variables.len(), LAND_COMMON_VARIABLES.len());
    assert_eq!(land.dimensions[1].length, DimensionLength::Fixed(1));

    let sea = tables.common(DeploymentMode::Sea).unwrap();
    assert_eq!(sea.variables[1].dimensions, vec!["time"]);

    assert!(tables.common(DeploymentMode::Air).unwrap_err().is_lookup());

    let product = tables
        .product(PRODUCT_CLOUD_BASE, DeploymentMode::Land)
        .unwrap()
        .unwrap();
    assert_eq!(product.variables.len(), 4);
    assert!(product.global_attributes.is_empty());

    let sea_product = tables
        .product(PRODUCT_CLOUD_BASE, DeploymentMode::Sea)
        .unwrap()
        .unwrap();
    assert_eq!(sea_product.variables.len(), 1);

    assert!(tables
        .product(PRODUCT_UNDEFINED, DeploymentMode::Land)
        .unwrap()
        .is_none());
}

#[test]
fn test_product_definitions_are_memoised() {
    let fixture = VocabFixture::new();
    let mut store = VocabularyStore::new();
    let tables = store
        .load(DEFAULT_VOCAB_URL, VERSION, Some(fixture.root()))
        .unwrap();

    let first = tables
        .product(PRODUCT_BACKSCATTER, DeploymentMode::Land)
        .unwrap()
        .unwrap();
    fixture.remove("aerosol-backscatter/variables-specific.tsv");
    let second = tables
        .product(PRODUCT_BACKSCATTER, DeploymentMode::Land)
        .unwrap()
        .unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn test_malformed_table_is_parse_error() {
    let fixture = VocabFixture::new();
    fixture.write(
        "_vocabularies/data-products.tsv",
        "Product\tDescription\nx\ty\n",
    );

    let mut store = VocabularyStore::new();
    let err = store
        .load(DEFAULT_VOCAB_URL, VERSION, Some(fixture.root()))
        .unwrap_err();
    assert!(matches!(err, VocabError::Parse { .. }));
}
