//! The resolved schema of one AMOF file.

use amof_common::{AttrValue, DataType, DeploymentMode, DimensionLength, QcFlagSet};
use serde::Serialize;

/// Where a variable definition came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VariableGroup {
    /// The common table of the deployment mode.
    Common,
    /// A product-specific table (product name).
    Product(String),
}

/// A dimension of the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSpec {
    pub name: String,
    pub length: DimensionLength,
    pub units: String,
    /// Declared by the common table rather than a product.
    pub common: bool,
}

/// A variable of the file with its attribute template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSpec {
    pub name: String,
    pub data_type: DataType,
    /// Dimension names, outermost first.
    pub dimensions: Vec<String>,
    /// Attributes in declaration order. Unresolved values are placeholders.
    pub attributes: Vec<(String, AttrValue)>,
    pub flags: Option<QcFlagSet>,
    pub group: VariableGroup,
}

impl VariableSpec {
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn is_qc(&self) -> bool {
        self.flags.is_some()
    }

    pub fn is_common(&self) -> bool {
        self.group == VariableGroup::Common
    }

    /// Product that contributed this variable, if any.
    pub fn source_product(&self) -> Option<&str> {
        match &self.group {
            VariableGroup::Common => None,
            VariableGroup::Product(name) => Some(name),
        }
    }
}

/// Dimensions, variables and global attributes of one file, together with
/// the request that produced them.
///
/// Built fresh for each file; nothing refers back to the vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSchema {
    pub instrument: String,
    pub platform: String,
    pub mode: DeploymentMode,
    pub products: Vec<String>,
    /// Vocabulary version the schema was resolved against.
    pub version: String,
    pub dimensions: Vec<DimensionSpec>,
    pub variables: Vec<VariableSpec>,
    pub global_attributes: Vec<(String, AttrValue)>,
}

impl ResolvedSchema {
    pub fn dimension(&self, name: &str) -> Option<&DimensionSpec> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn global_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.global_attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Names of variables from the common table.
    pub fn common_variable_names(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|v| v.is_common())
            .map(|v| v.name.clone())
            .collect()
    }

    /// Names of dimensions from the common table.
    pub fn common_dimension_names(&self) -> Vec<String> {
        self.dimensions
            .iter()
            .filter(|d| d.common)
            .map(|d| d.name.clone())
            .collect()
    }

    /// Attributes still holding a placeholder, as `name` for global
    /// attributes and `variable:name` for variable attributes.
    pub fn placeholders(&self) -> Vec<String> {
        let globals = self
            .global_attributes
            .iter()
            .filter(|(_, v)| v.is_placeholder())
            .map(|(k, _)| k.clone());
        let variables = self.variables.iter().flat_map(|var| {
            var.attributes
                .iter()
                .filter(|(_, v)| v.is_placeholder())
                .map(move |(k, _)| format!("{}:{}", var.name, k))
        });
        globals.chain(variables).collect()
    }
}
