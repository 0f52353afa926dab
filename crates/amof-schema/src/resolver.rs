//! Merging common and product definitions into a [`ResolvedSchema`].
//!
//! The merge is ordered deduplication: the common definition of the
//! deployment mode comes first, then each product in caller order. A
//! dimension, variable or global attribute that is already present is
//! never replaced, so the first definition always wins.

use std::collections::HashSet;

use amof_common::placeholder::{global_placeholder, is_template, variable_placeholder};
use amof_common::{AttrValue, DeploymentMode, DimensionLength};
use amof_vocab::{
    DimensionDef, GlobalAttributeDef, InstrumentDef, ProductEntry, VariableDef, VocabularyTables,
};
use tracing::{debug, info, warn};

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{DimensionSpec, ResolvedSchema, VariableGroup, VariableSpec};

/// Platform used when neither the caller nor the vocabulary names one.
pub const MOBILE_PLATFORM: &str = "mobile";

/// Instrument id used in schemas built from a product alone.
pub const GENERIC_INSTRUMENT: &str = "instrument";

/// Variable attributes written in the variable's own data type.
const TYPE_BOUND_ATTRIBUTES: &[&str] = &["_FillValue", "valid_min", "valid_max"];

/// Resolves schemas against one set of vocabulary tables.
pub struct SchemaResolver<'a> {
    tables: &'a VocabularyTables,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(tables: &'a VocabularyTables) -> Self {
        Self { tables }
    }

    /// Resolve the schema for an instrument producing `products` in `mode`.
    ///
    /// The platform is `platform` when given, else the instrument's fixed
    /// site from the vocabulary, else [`MOBILE_PLATFORM`].
    pub fn resolve<S: AsRef<str>>(
        &self,
        instrument_id: &str,
        products: &[S],
        mode: DeploymentMode,
        platform: Option<&str>,
    ) -> SchemaResult<ResolvedSchema> {
        let instrument = self
            .tables
            .instrument(instrument_id)
            .ok_or_else(|| SchemaError::InstrumentNotFound(instrument_id.to_string()))?;

        let platform = platform
            .map(str::to_string)
            .or_else(|| instrument.default_platform.clone())
            .unwrap_or_else(|| MOBILE_PLATFORM.to_string());

        self.build(instrument_id, Some(instrument), products, mode, platform)
    }

    /// Resolve the schema for a single product with no instrument lookup.
    ///
    /// Instrument attributes stay as placeholders and the file name uses
    /// [`GENERIC_INSTRUMENT`]. The platform defaults to [`MOBILE_PLATFORM`].
    pub fn resolve_for_product(
        &self,
        product: &str,
        mode: DeploymentMode,
        platform: Option<&str>,
    ) -> SchemaResult<ResolvedSchema> {
        let platform = platform.unwrap_or(MOBILE_PLATFORM).to_string();
        self.build(GENERIC_INSTRUMENT, None, &[product], mode, platform)
    }

    /// Products listed by the vocabulary, in table order.
    pub fn list_products(&self) -> Vec<ProductEntry> {
        self.tables.products().cloned().collect()
    }

    /// Products the vocabulary declares for an instrument.
    pub fn list_instrument_products(&self, instrument_id: &str) -> SchemaResult<Vec<String>> {
        self.tables
            .instrument(instrument_id)
            .map(|i| i.products.clone())
            .ok_or_else(|| SchemaError::InstrumentNotFound(instrument_id.to_string()))
    }

    fn build<S: AsRef<str>>(
        &self,
        instrument_id: &str,
        instrument: Option<&InstrumentDef>,
        products: &[S],
        mode: DeploymentMode,
        platform: String,
    ) -> SchemaResult<ResolvedSchema> {
        if products.is_empty() {
            return Err(SchemaError::NoProducts);
        }
        let product_names: Vec<String> = products.iter().map(|p| p.as_ref().to_string()).collect();

        let common = self.tables.common(mode)?;
        let mut merge = Merge::default();
        merge.add_dimensions(&common.dimensions, true);
        merge.add_variables(&common.variables, VariableGroup::Common);
        merge.add_global_attributes(self.tables.global_attributes());

        for name in &product_names {
            let product = self
                .tables
                .product(name, mode)?
                .ok_or_else(|| SchemaError::ProductNotFound {
                    product: name.clone(),
                    mode,
                })?;
            merge.add_dimensions(&product.dimensions, false);
            merge.add_variables(&product.variables, VariableGroup::Product(name.clone()));
            merge.add_global_attributes(product.global_attributes.iter());
        }

        merge.complete_dimensions();

        if let Some(instrument) = instrument {
            merge.fill_declared("source", &instrument.descriptor);
            merge.fill_declared("instrument_manufacturer", &instrument.manufacturer);
            merge.fill_declared("instrument_model", &instrument.model);
            merge.fill_declared("instrument_serial_number", &instrument.serial_number);
        }
        merge.set("platform", AttrValue::Text(platform.clone()));
        merge.set("deployment_mode", AttrValue::Text(mode.as_str().to_string()));

        let schema = ResolvedSchema {
            instrument: instrument_id.to_string(),
            platform,
            mode,
            products: product_names,
            version: self.tables.version().to_string(),
            dimensions: merge.dimensions,
            variables: merge.variables,
            global_attributes: merge.global_attributes,
        };

        info!(
            instrument = %schema.instrument,
            products = ?schema.products,
            mode = %mode,
            platform = %schema.platform,
            dimensions = schema.dimensions.len(),
            variables = schema.variables.len(),
            "Resolved schema"
        );

        Ok(schema)
    }
}

/// Products the vocabulary lists. Read-only over the tables.
pub fn list_products(tables: &VocabularyTables) -> Vec<String> {
    tables.product_names()
}

/// Accumulator for the ordered first-definition-wins merge.
#[derive(Default)]
struct Merge {
    dimensions: Vec<DimensionSpec>,
    variables: Vec<VariableSpec>,
    global_attributes: Vec<(String, AttrValue)>,
    dimension_names: HashSet<String>,
    variable_names: HashSet<String>,
}

impl Merge {
    fn add_dimensions(&mut self, defs: &[DimensionDef], common: bool) {
        for def in defs {
            if !self.dimension_names.insert(def.name.clone()) {
                debug!(dimension = %def.name, "Dimension already defined, keeping first");
                continue;
            }
            self.dimensions.push(DimensionSpec {
                name: def.name.clone(),
                length: def.length,
                units: def.units.clone(),
                common,
            });
        }
    }

    fn add_variables(&mut self, defs: &[VariableDef], group: VariableGroup) {
        for def in defs {
            if !self.variable_names.insert(def.name.clone()) {
                debug!(variable = %def.name, group = ?group, "Variable already defined, keeping first");
                continue;
            }
            self.variables.push(variable_spec(def, group.clone()));
        }
    }

    fn add_global_attributes<'d>(&mut self, defs: impl Iterator<Item = &'d GlobalAttributeDef>) {
        for def in defs {
            if self.global_attributes.iter().any(|(k, _)| *k == def.name) {
                continue;
            }
            let value = match def.fixed() {
                Some(fixed) => AttrValue::Text(fixed.to_string()),
                None => AttrValue::Text(global_placeholder(&def.description, &def.example)),
            };
            self.global_attributes.push((def.name.clone(), value));
        }
    }

    /// Declare any dimension a variable uses but no table defines, with an
    /// open length.
    fn complete_dimensions(&mut self) {
        let referenced: Vec<(String, String)> = self
            .variables
            .iter()
            .flat_map(|v| v.dimensions.iter().map(move |d| (d.clone(), v.name.clone())))
            .collect();
        for (dimension, variable) in referenced {
            if self.dimension_names.insert(dimension.clone()) {
                warn!(
                    dimension = %dimension,
                    variable = %variable,
                    "Variable uses an undeclared dimension, adding it with open length"
                );
                self.dimensions.push(DimensionSpec {
                    name: dimension,
                    length: DimensionLength::Open,
                    units: String::new(),
                    common: false,
                });
            }
        }
    }

    /// Replace a declared global attribute with a known value. Attributes
    /// the tables do not declare are left out, as are empty values.
    fn fill_declared(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        if let Some((_, existing)) = self.global_attributes.iter_mut().find(|(k, _)| k == name) {
            *existing = AttrValue::Text(value.to_string());
        }
    }

    fn set(&mut self, name: &str, value: AttrValue) {
        match self.global_attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.global_attributes.push((name.to_string(), value)),
        }
    }
}

fn variable_spec(def: &VariableDef, group: VariableGroup) -> VariableSpec {
    let attributes = def
        .attributes
        .iter()
        .map(|(name, raw)| {
            let value = match (&def.flags, name.as_str()) {
                (Some(flags), "flag_values") => flags.flag_values_attr(),
                (Some(flags), "flag_meanings") => flags.flag_meanings_attr(),
                _ => variable_attribute(name, raw),
            };
            (name.clone(), value)
        })
        .collect();

    VariableSpec {
        name: def.name.clone(),
        data_type: def.data_type,
        dimensions: def.dimensions.clone(),
        attributes,
        flags: def.flags.clone(),
        group,
    }
}

/// Template value of a variable attribute. `<...>` templates and
/// non-numeric type-bound values become placeholders.
fn variable_attribute(name: &str, raw: &str) -> AttrValue {
    if is_template(raw) {
        return AttrValue::Text(variable_placeholder(raw));
    }
    if TYPE_BOUND_ATTRIBUTES.contains(&name) {
        return AttrValue::parse_numeric(raw)
            .unwrap_or_else(|| AttrValue::Text(variable_placeholder(raw)));
    }
    AttrValue::Text(raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_attribute_templates() {
        assert_eq!(
            variable_attribute("valid_min", "<derived from file>"),
            AttrValue::Text("CHANGE: derived from file".to_string())
        );
        assert_eq!(variable_attribute("_FillValue", "-1.00E+20"), AttrValue::Float(-1.0e20));
        assert_eq!(variable_attribute("_FillValue", "-127b"), AttrValue::Int(-127));
        assert_eq!(
            variable_attribute("units", "m s-1"),
            AttrValue::Text("m s-1".to_string())
        );
        assert!(variable_attribute("comment", "").is_placeholder());
    }

    #[test]
    fn test_merge_first_definition_wins() {
        let mut merge = Merge::default();
        let a = DimensionDef {
            name: "time".into(),
            length: DimensionLength::Open,
            units: "1".into(),
        };
        let b = DimensionDef {
            name: "time".into(),
            length: DimensionLength::Fixed(5),
            units: "s".into(),
        };
        merge.add_dimensions(&[a], true);
        merge.add_dimensions(&[b], false);

        assert_eq!(merge.dimensions.len(), 1);
        assert_eq!(merge.dimensions[0].length, DimensionLength::Open);
        assert!(merge.dimensions[0].common);
    }

    #[test]
    fn test_fill_declared_ignores_undeclared_and_empty() {
        let mut merge = Merge::default();
        merge.set("source", AttrValue::from("CHANGE: Name"));
        merge.fill_declared("source", "");
        merge.fill_declared("instrument_model", "X1");

        assert_eq!(merge.global_attributes.len(), 1);
        assert!(merge.global_attributes[0].1.is_placeholder());

        merge.fill_declared("source", "My instrument");
        assert_eq!(merge.global_attributes[0].1, AttrValue::from("My instrument"));
    }
}
