//! Path conventions of the vocabulary repository.
//!
//! A local mirror must reproduce this layout exactly; every path here is
//! relative to the mirror root (or the remote base URL).

use amof_common::DeploymentMode;

const TSV_ROOT: &str = "product-definitions/tsv";

/// Common global attribute table.
pub fn common_global_attributes(version: &str) -> String {
    format!("{version}/{TSV_ROOT}/_common/global-attributes.tsv")
}

/// Common dimension table for a deployment mode.
pub fn common_dimensions(version: &str, mode: DeploymentMode) -> String {
    format!("{version}/{TSV_ROOT}/_common/dimensions-{mode}.tsv")
}

/// Common variable table for a deployment mode.
pub fn common_variables(version: &str, mode: DeploymentMode) -> String {
    format!("{version}/{TSV_ROOT}/_common/variables-{mode}.tsv")
}

/// Product-specific dimension table.
pub fn product_dimensions(version: &str, product: &str) -> String {
    format!("{version}/{TSV_ROOT}/{product}/dimensions-specific.tsv")
}

/// Product-specific variable table shared by all deployment modes.
pub fn product_variables(version: &str, product: &str) -> String {
    format!("{version}/{TSV_ROOT}/{product}/variables-specific.tsv")
}

/// Product-specific variable table for one deployment mode. Takes
/// precedence over [`product_variables`] when present.
pub fn product_mode_variables(version: &str, product: &str, mode: DeploymentMode) -> String {
    format!("{version}/{TSV_ROOT}/{product}/variables-specific-{mode}.tsv")
}

/// Optional product-specific global attribute table.
pub fn product_global_attributes(version: &str, product: &str) -> String {
    format!("{version}/{TSV_ROOT}/{product}/global-attributes-specific.tsv")
}

/// List of data products.
pub fn data_products(version: &str) -> String {
    format!("{version}/{TSV_ROOT}/_vocabularies/data-products.tsv")
}

/// Instrument vocabulary table by name, e.g.
/// `ncas-instrument-name-and-descriptors`.
pub fn instrument_vocab(version: &str, vocab_name: &str) -> String {
    format!("{version}/{TSV_ROOT}/_instrument_vocabs/{vocab_name}.tsv")
}

/// NCAS instrument vocabulary (required).
pub const NCAS_INSTRUMENTS: &str = "ncas-instrument-name-and-descriptors";
/// Community instrument vocabulary (optional).
pub const COMMUNITY_INSTRUMENTS: &str = "community-instrument-name-and-descriptors";
