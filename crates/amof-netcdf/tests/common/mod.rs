//! Common helpers for amof-netcdf integration tests.
//!
//! Builds files from schemas resolved against the synthetic vocabulary in
//! `test-utils`.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use amof_common::{AttrValue, DataType, DeploymentMode};
use amof_netcdf::native::{attribute_value, data_type, read_values, to_attr_value};
use amof_netcdf::{BuiltFile, FileBuilder, FileNameComponents};
use amof_schema::{ResolvedSchema, SchemaResolver};
use amof_vocab::{LocalMirror, VocabularyStore};
use netcdf::File;
use test_utils::*;

/// Time steps written by [`build_backscatter`].
pub const TIME_STEPS: usize = 4;
/// Altitude gates written by [`build_backscatter`].
pub const ALTITUDE_GATES: usize = 3;

/// Resolve the fixed instrument with the given products.
pub fn resolve(products: &[&str], mode: DeploymentMode) -> ResolvedSchema {
    let fixture = VocabFixture::new();
    let mut store = VocabularyStore::new();
    let tables = store
        .load_from(Arc::new(LocalMirror::new(fixture.root())), VERSION)
        .expect("Failed to load fixture vocabulary");
    SchemaResolver::new(&tables)
        .resolve(FIXED_INSTRUMENT, products, mode, None)
        .expect("Failed to resolve schema")
}

pub fn names(schema: &ResolvedSchema) -> FileNameComponents {
    FileNameComponents::from_schema(schema).with_date("20221117")
}

/// A land aerosol-backscatter file with fixed lengths.
pub fn build_backscatter(dir: &Path) -> (ResolvedSchema, BuiltFile) {
    let schema = resolve(&[PRODUCT_BACKSCATTER], DeploymentMode::Land);
    let built = FileBuilder::new(&schema)
        .with_lengths([("time", TIME_STEPS), ("altitude", ALTITUDE_GATES)])
        .build(dir, &names(&schema))
        .expect("Failed to build file");
    (schema, built)
}

/// All data of a variable as f64.
pub fn values(file: &File, name: &str) -> Vec<f64> {
    let var = file.variable(name).expect("Variable missing");
    let dtype = data_type(&var).expect("Unsupported type");
    read_values(&var, dtype).expect("Failed to read values")
}

pub fn var_type(file: &File, name: &str) -> DataType {
    data_type(&file.variable(name).expect("Variable missing")).expect("Unsupported type")
}

/// A variable attribute in the crate's attribute model.
pub fn var_attr(file: &File, name: &str, attr: &str) -> Option<AttrValue> {
    let var = file.variable(name)?;
    to_attr_value(&attribute_value(&var, attr)?)
}

/// A global attribute in the crate's attribute model.
pub fn global_attr(file: &File, attr: &str) -> Option<AttrValue> {
    let value = file.attribute(attr)?.value().ok()?;
    to_attr_value(&value)
}
