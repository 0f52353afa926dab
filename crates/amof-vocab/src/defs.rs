//! Row types of the vocabulary tables.

use std::collections::HashMap;

use amof_common::{DataType, DimensionLength, QcFlagSet};

/// Row of a global attribute table.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalAttributeDef {
    pub name: String,
    pub description: String,
    pub example: String,
    /// Value the standard fixes for every file; empty when the value is
    /// site- or deployment-specific.
    pub fixed_value: String,
    pub compliance_rules: String,
    pub provenance: String,
}

impl GlobalAttributeDef {
    /// The fixed value, if the vocabulary declares one.
    pub fn fixed(&self) -> Option<&str> {
        let value = self.fixed_value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Row of a dimension table.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionDef {
    pub name: String,
    pub length: DimensionLength,
    pub units: String,
}

/// A variable definition assembled from consecutive rows of a variable table.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub data_type: DataType,
    /// Dimension names in declaration order; empty for scalars.
    pub dimensions: Vec<String>,
    /// Attribute templates in declaration order, excluding the structural
    /// `type` and `dimension` rows. Values are raw vocabulary text.
    pub attributes: Vec<(String, String)>,
    /// Flag set for QC variables (those declaring `flag_values`).
    pub flags: Option<QcFlagSet>,
}

impl VariableDef {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_qc(&self) -> bool {
        self.flags.is_some()
    }
}

/// Row of an instrument vocabulary table.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentDef {
    pub id: String,
    pub descriptor: String,
    pub products: Vec<String>,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    /// Site of a fixed instrument; `None` for mobile instruments or when
    /// the vocabulary leaves it blank.
    pub default_platform: Option<String>,
}

/// Row of the data product list.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEntry {
    pub name: String,
    pub description: String,
}

/// Common schema fragment for one deployment mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonDefinition {
    pub dimensions: Vec<DimensionDef>,
    pub variables: Vec<VariableDef>,
}

/// Product-specific schema fragment for one deployment mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefinition {
    pub name: String,
    pub dimensions: Vec<DimensionDef>,
    pub variables: Vec<VariableDef>,
    pub global_attributes: Vec<GlobalAttributeDef>,
}

/// Rows of a table keyed by their row identifier (first column).
///
/// Iteration follows file order. When a key repeats, the first row wins.
#[derive(Debug, Clone, Default)]
pub struct KeyedTable<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> KeyedTable<T> {
    /// Build from rows, keying each with `key`. Returns the table and the
    /// keys that were dropped as duplicates.
    pub fn from_rows(rows: Vec<T>, key: impl Fn(&T) -> &str) -> (Self, Vec<String>) {
        let mut kept = Vec::with_capacity(rows.len());
        let mut index = HashMap::new();
        let mut duplicates = Vec::new();
        for row in rows {
            let k = key(&row).to_string();
            if index.contains_key(&k) {
                duplicates.push(k);
                continue;
            }
            index.insert(k, kept.len());
            kept.push(row);
        }
        (Self { rows: kept, index }, duplicates)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_table_first_wins() {
        let rows = vec![("a", 1), ("b", 2), ("a", 3)];
        let (table, duplicates) = KeyedTable::from_rows(rows, |r| r.0);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(&("a", 1)));
        assert_eq!(duplicates, vec!["a".to_string()]);
        assert_eq!(table.iter().map(|r| r.1).collect::<Vec<_>>(), vec![1, 2]);
    }
}
