//! Parsers for the tab-separated vocabulary tables.
//!
//! Every table has a header row. Columns are looked up by header name
//! (case-insensitive), so extra columns and reordering are tolerated;
//! missing required columns are a parse error naming the table.

use std::collections::HashMap;

use amof_common::{DataType, DimensionLength, QcFlagSet};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::defs::{DimensionDef, GlobalAttributeDef, InstrumentDef, ProductEntry, VariableDef};
use crate::error::{VocabError, VocabResult};

/// Column index by normalised header name.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.index
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }
}

/// Read a table into its column map and non-empty records with line numbers.
fn read_table(
    path: &str,
    text: &str,
    required: &[&str],
) -> VocabResult<(Columns, Vec<(u64, StringRecord)>)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| VocabError::parse(path, format!("Invalid header row: {}", e)))?;
    let index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| !index.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Err(VocabError::parse(
            path,
            format!("Missing required column(s): {}", missing.join(", ")),
        ));
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| VocabError::parse(path, e.to_string()))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        records.push((line, record));
    }

    Ok((Columns { index }, records))
}

/// Parse a global attribute table.
pub fn parse_global_attributes(path: &str, text: &str) -> VocabResult<Vec<GlobalAttributeDef>> {
    let (columns, records) = read_table(path, text, &["name"])?;

    Ok(records
        .iter()
        .filter(|(_, r)| !columns.get(r, "name").is_empty())
        .map(|(_, r)| GlobalAttributeDef {
            name: columns.get(r, "name").to_string(),
            description: columns.get(r, "description").to_string(),
            example: columns.get(r, "example").to_string(),
            fixed_value: columns.get(r, "fixed value").to_string(),
            compliance_rules: columns.get(r, "compliance checking rules").to_string(),
            provenance: columns.get(r, "convention providence").to_string(),
        })
        .collect())
}

/// Parse a dimension table.
pub fn parse_dimensions(path: &str, text: &str) -> VocabResult<Vec<DimensionDef>> {
    let (columns, records) = read_table(path, text, &["name", "length"])?;

    Ok(records
        .iter()
        .filter(|(_, r)| !columns.get(r, "name").is_empty())
        .map(|(_, r)| DimensionDef {
            name: columns.get(r, "name").to_string(),
            length: DimensionLength::from_vocabulary(columns.get(r, "length")),
            units: columns.get(r, "units").to_string(),
        })
        .collect())
}

/// Variable under construction while walking the rows of a variable table.
struct PendingVariable {
    name: String,
    line: u64,
    attributes: Vec<(String, String)>,
}

impl PendingVariable {
    fn finish(self, path: &str) -> VocabResult<VariableDef> {
        let mut data_type = None;
        let mut dimensions = Vec::new();
        let mut attributes = Vec::new();

        for (name, value) in self.attributes {
            match name.as_str() {
                "type" => {
                    let parsed = value.parse::<DataType>().map_err(|e| {
                        VocabError::parse(path, format!("variable '{}': {}", self.name, e))
                    })?;
                    data_type = Some(parsed);
                }
                "dimension" | "dimensions" => {
                    dimensions = value
                        .split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {
                    if !attributes.iter().any(|(k, _): &(String, String)| *k == name) {
                        attributes.push((name, value));
                    }
                }
            }
        }

        let data_type = data_type.ok_or_else(|| {
            VocabError::parse(
                path,
                format!(
                    "variable '{}' (line {}) has no 'type' attribute",
                    self.name, self.line
                ),
            )
        })?;

        let flag_values = attributes.iter().find(|(k, _)| k == "flag_values");
        let flag_meanings = attributes.iter().find(|(k, _)| k == "flag_meanings");
        let flags = match (flag_values, flag_meanings) {
            (Some((_, values)), Some((_, meanings))) => Some(
                QcFlagSet::from_vocabulary(values, meanings).map_err(|e| {
                    VocabError::parse(path, format!("variable '{}': {}", self.name, e))
                })?,
            ),
            (None, None) => None,
            _ => {
                return Err(VocabError::parse(
                    path,
                    format!(
                        "variable '{}' must declare both flag_values and flag_meanings",
                        self.name
                    ),
                ))
            }
        };

        Ok(VariableDef {
            name: self.name,
            data_type,
            dimensions,
            attributes,
            flags,
        })
    }
}

/// Parse a variable table.
///
/// A row with a non-empty `Variable` column starts a new variable; the
/// rows after it (with an empty `Variable` column) add its attributes.
/// The `type` and `dimension` attributes are structural and are lifted
/// out of the attribute list.
pub fn parse_variables(path: &str, text: &str) -> VocabResult<Vec<VariableDef>> {
    let (columns, records) = read_table(path, text, &["variable", "attribute", "value"])?;

    let mut pending: Vec<PendingVariable> = Vec::new();
    for (line, record) in &records {
        let variable = columns.get(record, "variable");
        let attribute = columns.get(record, "attribute");
        let value = columns.get(record, "value");

        if !variable.is_empty() {
            pending.push(PendingVariable {
                name: variable.to_string(),
                line: *line,
                attributes: Vec::new(),
            });
        }
        if attribute.is_empty() {
            continue;
        }

        let current = pending.last_mut().ok_or_else(|| {
            VocabError::parse(
                path,
                format!("line {}: attribute '{}' before any variable", line, attribute),
            )
        })?;
        current
            .attributes
            .push((attribute.to_string(), value.to_string()));
    }

    pending.into_iter().map(|p| p.finish(path)).collect()
}

/// Parse an instrument vocabulary table.
pub fn parse_instruments(path: &str, text: &str) -> VocabResult<Vec<InstrumentDef>> {
    let (columns, records) = read_table(path, text, &["new instrument name"])?;

    Ok(records
        .iter()
        .filter(|(_, r)| !columns.get(r, "new instrument name").is_empty())
        .map(|(_, r)| InstrumentDef {
            id: columns.get(r, "new instrument name").to_string(),
            descriptor: columns.get(r, "descriptor").to_string(),
            products: columns
                .get(r, "data product(s)")
                .split('|')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            manufacturer: columns.get(r, "manufacturer").to_string(),
            model: columns.get(r, "model no.").to_string(),
            serial_number: columns.get(r, "serial number").to_string(),
            default_platform: parse_platform(columns.get(r, "mobile/fixed (loc)")),
        })
        .collect())
}

/// Parse the data product list.
pub fn parse_products(path: &str, text: &str) -> VocabResult<Vec<ProductEntry>> {
    let (columns, records) = read_table(path, text, &["data product"])?;

    Ok(records
        .iter()
        .filter(|(_, r)| !columns.get(r, "data product").is_empty())
        .map(|(_, r)| ProductEntry {
            name: columns.get(r, "data product").to_string(),
            description: columns.get(r, "description").to_string(),
        })
        .collect())
}

/// Platform of a fixed instrument (`fixed - <site>`); mobile or blank
/// entries have no default.
fn parse_platform(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if !raw.to_lowercase().starts_with("fixed") {
        return None;
    }
    raw.split_once('-')
        .map(|(_, site)| site.trim())
        .filter(|site| !site.is_empty())
        .map(str::to_string)
}
