//! Merging user-supplied metadata documents into a file.
//!
//! A document is a flat list of entries, each naming a target attribute
//! (`name` for a global attribute, `variable:name` for a variable
//! attribute), a value, an optional type tag and an optional append flag.
//! Four encodings are accepted:
//!
//! - CSV: `name,value[,type=<tag>][,append=<bool>]`, one entry per line.
//!   Commas inside the value are kept.
//! - JSON / YAML: a top-level map of `name: value` or
//!   `name: {value, type, append}`.
//! - XML: `<root><name><value/><type/><append/></name></root>`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use amof_common::AttrValue;
use csv::{ReaderBuilder, Trim};
use netcdf::{AttributeValue, FileMut};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{NetcdfError, NetcdfResult};
use crate::native::{attribute_for, attribute_text, current_shape, data_type, untyped_attribute};
use crate::updater::update_variable;

// ============================================================================
// Document model
// ============================================================================

/// Encoding of a metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    Csv,
    Json,
    Yaml,
    Xml,
}

impl MetadataFormat {
    /// Format implied by a file extension. Unknown extensions fall back to
    /// CSV with a warning.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse().unwrap_or_else(|_| {
            warn!(path = ?path, "Unknown metadata file type, trying CSV");
            MetadataFormat::Csv
        })
    }
}

impl FromStr for MetadataFormat {
    type Err = NetcdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(MetadataFormat::Csv),
            "json" => Ok(MetadataFormat::Json),
            "yaml" | "yml" => Ok(MetadataFormat::Yaml),
            "xml" => Ok(MetadataFormat::Xml),
            other => Err(NetcdfError::metadata(format!("unknown format '{}'", other))),
        }
    }
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataFormat::Csv => "csv",
            MetadataFormat::Json => "json",
            MetadataFormat::Yaml => "yaml",
            MetadataFormat::Xml => "xml",
        };
        f.write_str(name)
    }
}

/// Requested type of an entry's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Str,
    Int,
    Float,
    /// Stored as integer 0 or 1.
    Bool,
}

impl FromStr for TypeTag {
    type Err = NetcdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "string" => Ok(TypeTag::Str),
            "int" | "integer" => Ok(TypeTag::Int),
            "float" => Ok(TypeTag::Float),
            "bool" => Ok(TypeTag::Bool),
            other => Err(NetcdfError::metadata(format!("unknown type '{}'", other))),
        }
    }
}

/// One attribute assignment from a metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub target: String,
    pub value: String,
    pub type_tag: Option<TypeTag>,
    pub append: bool,
}

impl MetadataEntry {
    pub fn new(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            value: value.into(),
            type_tag: None,
            append: false,
        }
    }

    /// The value converted per its type tag. A value that does not convert
    /// is kept as text.
    pub fn attr_value(&self) -> AttrValue {
        let text = || AttrValue::Text(self.value.clone());
        let raw = self.value.trim();
        let converted = match self.type_tag {
            None | Some(TypeTag::Str) => return text(),
            Some(TypeTag::Int) => raw.parse::<i64>().ok().map(AttrValue::Int),
            Some(TypeTag::Float) => raw.parse::<f64>().ok().map(AttrValue::Float),
            Some(TypeTag::Bool) => match raw.to_ascii_lowercase().as_str() {
                "true" => Some(AttrValue::Int(1)),
                "false" => Some(AttrValue::Int(0)),
                _ => None,
            },
        };
        converted.unwrap_or_else(|| {
            warn!(
                attribute = %self.target,
                value = %self.value,
                type_tag = ?self.type_tag,
                "Value could not be converted, keeping text"
            );
            text()
        })
    }

    /// `(variable, attribute)` for a `variable:attribute` target.
    pub fn variable_target(&self) -> Option<(&str, &str)> {
        self.target.split_once(':')
    }
}

fn parse_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

// ============================================================================
// Parsers
// ============================================================================

/// Parse a metadata document.
pub fn parse_metadata(text: &str, format: MetadataFormat) -> NetcdfResult<Vec<MetadataEntry>> {
    let entries = match format {
        MetadataFormat::Csv => parse_csv(text)?,
        MetadataFormat::Json => {
            let doc: Value = serde_json::from_str(text)
                .map_err(|e| NetcdfError::metadata(format!("invalid JSON: {}", e)))?;
            entries_from_map(doc)?
        }
        MetadataFormat::Yaml => {
            let doc: Value = serde_yaml::from_str(text)
                .map_err(|e| NetcdfError::metadata(format!("invalid YAML: {}", e)))?;
            entries_from_map(doc)?
        }
        MetadataFormat::Xml => parse_xml(text)?,
    };
    debug!(format = %format, entries = entries.len(), "Parsed metadata");
    Ok(entries)
}

fn parse_csv(text: &str) -> NetcdfResult<Vec<MetadataEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| NetcdfError::metadata(format!("invalid CSV: {}", e)))?;
        let fields: Vec<&str> = record.iter().collect();
        let target = fields.first().map(|f| f.trim()).unwrap_or_default();
        if fields.len() < 2 || target.is_empty() {
            continue;
        }

        let mut entry = MetadataEntry::new(target, "");
        let mut end = fields.len();
        // Up to two trailing `type=` / `append=` options. Spaces inside the
        // value fields are kept.
        while end > 2 {
            match fields[end - 1].split_once('=').map(|(k, v)| (k.trim(), v)) {
                Some(("type", tag)) => entry.type_tag = Some(tag.trim().parse()?),
                Some(("append", flag)) => entry.append = parse_bool(flag.trim()),
                _ => break,
            }
            end -= 1;
            if fields.len() - end == 2 {
                break;
            }
        }
        entry.value = fields[1..end].join(",").trim().to_string();
        entries.push(entry);
    }
    Ok(entries)
}

fn scalar_text(value: &Value) -> NetcdfResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(NetcdfError::metadata(format!("expected a scalar, got {}", other))),
    }
}

fn entries_from_map(doc: Value) -> NetcdfResult<Vec<MetadataEntry>> {
    let Value::Object(map) = doc else {
        return Err(NetcdfError::metadata("top level must be a map of attributes"));
    };

    let mut entries = Vec::with_capacity(map.len());
    for (target, value) in map {
        let entry = match value {
            Value::Object(fields) => {
                let raw = fields.get("value").ok_or_else(|| {
                    NetcdfError::metadata(format!("entry '{}' has no value", target))
                })?;
                let mut entry = MetadataEntry::new(target, scalar_text(raw)?);
                if let Some(tag) = fields.get("type") {
                    entry.type_tag = Some(scalar_text(tag)?.parse()?);
                }
                if let Some(flag) = fields.get("append") {
                    entry.append = parse_bool(&scalar_text(flag)?);
                }
                entry
            }
            scalar => {
                let text = scalar_text(&scalar)?;
                MetadataEntry::new(target, text)
            }
        };
        entries.push(entry);
    }
    Ok(entries)
}

fn parse_xml(text: &str) -> NetcdfResult<Vec<MetadataEntry>> {
    let xml_err = |e: quick_xml::Error| NetcdfError::metadata(format!("invalid XML: {}", e));
    let utf8 = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();

    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<MetadataEntry> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => {
                depth += 1;
                match depth {
                    2 => current = Some(MetadataEntry::new(utf8(e.name().as_ref()), "")),
                    3 => field = Some(utf8(e.name().as_ref())),
                    _ => {}
                }
            }
            Event::Empty(e) if depth == 1 => {
                entries.push(MetadataEntry::new(utf8(e.name().as_ref()), ""));
            }
            Event::Text(t) if depth == 3 => {
                let text = t.unescape().map_err(xml_err)?.into_owned();
                if let (Some(entry), Some(name)) = (current.as_mut(), field.as_deref()) {
                    match name {
                        "value" => entry.value = text,
                        "type" => entry.type_tag = Some(text.parse()?),
                        "append" => entry.append = parse_bool(&text),
                        other => debug!(element = other, "Ignoring unknown metadata element"),
                    }
                }
            }
            Event::End(_) => {
                match depth {
                    2 => entries.extend(current.take()),
                    3 => field = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(NetcdfError::metadata("unexpected end of XML document"));
    }
    Ok(entries)
}

// ============================================================================
// Merger
// ============================================================================

/// Applies metadata documents to open files.
#[derive(Debug, Clone, Default)]
pub struct MetadataMerger {
    /// Set the global `geospatial_bounds` attribute when a document gives
    /// both latitude and longitude.
    pub derive_geospatial_bounds: bool,
}

impl MetadataMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geospatial_bounds(mut self, derive: bool) -> Self {
        self.derive_geospatial_bounds = derive;
        self
    }

    /// Read `source` and apply its entries to `file`. The format comes from
    /// the extension unless given. Returns the targets written.
    pub fn apply(
        &self,
        file: &mut FileMut,
        source: &Path,
        format: Option<MetadataFormat>,
    ) -> NetcdfResult<Vec<String>> {
        let format = format.unwrap_or_else(|| MetadataFormat::from_path(source));
        let text = fs::read_to_string(source)?;
        let entries = parse_metadata(&text, format)?;
        let applied = self.apply_entries(file, &entries)?;
        info!(source = ?source, format = %format, applied = applied.len(), "Merged metadata");
        Ok(applied)
    }

    /// Apply already-parsed entries to `file`.
    pub fn apply_entries(
        &self,
        file: &mut FileMut,
        entries: &[MetadataEntry],
    ) -> NetcdfResult<Vec<String>> {
        let mut applied = Vec::with_capacity(entries.len());
        let mut latitude = None;
        let mut longitude = None;

        for entry in entries {
            if let Some((variable, attr)) = entry.variable_target() {
                set_variable_attribute(file, variable, attr, entry)?;
            } else if is_location(&entry.target) && file.variable(&entry.target).is_some() {
                let value = write_location(file, entry)?;
                match entry.target.as_str() {
                    "latitude" => latitude = Some(value),
                    _ => longitude = Some(value),
                }
            } else {
                set_global_attribute(file, entry)?;
            }
            applied.push(entry.target.clone());
        }

        if self.derive_geospatial_bounds {
            if let (Some(lat), Some(lon)) = (latitude, longitude) {
                let bounds = format!("{}N {}E", lat, lon);
                debug!(bounds = %bounds, "Derived geospatial_bounds");
                file.add_attribute("geospatial_bounds", bounds)?;
                applied.push("geospatial_bounds".to_string());
            }
        }
        Ok(applied)
    }
}

fn is_location(target: &str) -> bool {
    target == "latitude" || target == "longitude"
}

/// New text for an appended attribute, or `None` if there is nothing to
/// append to.
fn appended(existing: Option<AttributeValue>, value: &AttrValue) -> Option<AttrValue> {
    let existing = existing?;
    match (attribute_text(&existing), value.as_text()) {
        (Some(old), Some(new)) => Some(AttrValue::Text(format!("{}\n{}", old, new))),
        _ => None,
    }
}

fn set_global_attribute(file: &mut FileMut, entry: &MetadataEntry) -> NetcdfResult<()> {
    let mut value = entry.attr_value();
    if entry.append {
        let existing = file.attribute(&entry.target).and_then(|a| a.value().ok());
        match appended(existing, &value) {
            Some(joined) => value = joined,
            None => debug!(attribute = %entry.target, "Nothing to append to, setting value"),
        }
    }
    file.add_attribute(&entry.target, untyped_attribute(&value))?;
    Ok(())
}

fn set_variable_attribute(
    file: &mut FileMut,
    variable: &str,
    attr: &str,
    entry: &MetadataEntry,
) -> NetcdfResult<()> {
    let mut var = file
        .variable_mut(variable)
        .ok_or_else(|| NetcdfError::VariableNotFound(variable.to_string()))?;
    let dtype = data_type(&var)?;

    let mut value = entry.attr_value();
    if entry.append {
        let existing = var.attribute(attr).and_then(|a| a.value().ok());
        if let Some(joined) = appended(existing, &value) {
            value = joined;
        }
    }
    var.put_attribute(attr, attribute_for(attr, &value, dtype))?;
    Ok(())
}

/// Write a latitude or longitude value to every element of its variable.
fn write_location(file: &mut FileMut, entry: &MetadataEntry) -> NetcdfResult<f64> {
    let value: f64 = entry.value.trim().parse().map_err(|_| {
        NetcdfError::metadata(format!("{} '{}' is not a number", entry.target, entry.value))
    })?;
    let count: usize = file
        .variable(&entry.target)
        .map(|var| current_shape(&var).iter().product())
        .unwrap_or(0);
    if count == 0 {
        debug!(variable = %entry.target, "Location variable has no elements yet");
        return Ok(value);
    }
    update_variable(file, &entry.target, &vec![value; count])?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(MetadataFormat::from_path(Path::new("m.YML")), MetadataFormat::Yaml);
        assert_eq!(MetadataFormat::from_path(Path::new("m.xml")), MetadataFormat::Xml);
        assert_eq!(MetadataFormat::from_path(Path::new("m.txt")), MetadataFormat::Csv);
        assert_eq!(MetadataFormat::from_path(Path::new("metadata")), MetadataFormat::Csv);
    }

    #[test]
    fn test_csv_rejoins_commas_and_reads_options() {
        let text = "title,Lidar, Chilbolton,type=str\nfocal_length,12,append=false,type=int\nproject,WOEST\nskipped\n";
        let entries = parse_metadata(text, MetadataFormat::Csv).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].value, "Lidar, Chilbolton");
        assert_eq!(entries[0].type_tag, Some(TypeTag::Str));
        assert_eq!(entries[1].value, "12");
        assert_eq!(entries[1].type_tag, Some(TypeTag::Int));
        assert!(!entries[1].append);
        assert_eq!(entries[2], MetadataEntry::new("project", "WOEST"));
    }

    #[test]
    fn test_csv_keeps_spaces_inside_values() {
        let text = "Conventions, CF-1.6, NCAS-AMF-2.0.0 \nauthor,Smith, J., type = str\n";
        let entries = parse_metadata(text, MetadataFormat::Csv).unwrap();
        assert_eq!(entries[0].value, "CF-1.6, NCAS-AMF-2.0.0");
        assert_eq!(entries[1].target, "author");
        assert_eq!(entries[1].value, "Smith, J.");
        assert_eq!(entries[1].type_tag, Some(TypeTag::Str));
    }

    #[test]
    fn test_json_and_yaml_keep_document_order() {
        let json = r#"{"zeta": "1", "project": "WOEST", "alpha": "2"}"#;
        let yaml = "zeta: 1\nproject: WOEST\nalpha: 2\n";
        for (text, format) in [(json, MetadataFormat::Json), (yaml, MetadataFormat::Yaml)] {
            let targets: Vec<String> = parse_metadata(text, format)
                .unwrap()
                .into_iter()
                .map(|e| e.target)
                .collect();
            assert_eq!(targets, vec!["zeta", "project", "alpha"], "{}", format);
        }
    }

    #[test]
    fn test_unknown_type_tag_is_error() {
        let err = parse_metadata("x,1,type=complex\n", MetadataFormat::Csv).unwrap_err();
        assert!(matches!(err, NetcdfError::MetadataFormat(_)));
    }

    #[test]
    fn test_json_scalar_and_object_entries() {
        let text = r#"{"project": "WOEST", "altitude": {"value": 12.5, "type": "float"}, "comment": {"value": "x", "append": "true"}}"#;
        let entries = parse_metadata(text, MetadataFormat::Json).unwrap();
        let altitude = entries.iter().find(|e| e.target == "altitude").unwrap();
        assert_eq!(altitude.attr_value(), AttrValue::Float(12.5));
        assert!(entries.iter().find(|e| e.target == "comment").unwrap().append);
    }

    #[test]
    fn test_yaml_entries() {
        let text = "project: WOEST\nflag:\n  value: 'true'\n  type: bool\n";
        let entries = parse_metadata(text, MetadataFormat::Yaml).unwrap();
        let flag = entries.iter().find(|e| e.target == "flag").unwrap();
        assert_eq!(flag.attr_value(), AttrValue::Int(1));
    }

    #[test]
    fn test_xml_entries() {
        let text = "<root><project><value>WOEST</value></project><count><value>3</value><type>int</type><append>false</append></count></root>";
        let entries = parse_metadata(text, MetadataFormat::Xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], MetadataEntry::new("project", "WOEST"));
        assert_eq!(entries[1].attr_value(), AttrValue::Int(3));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_metadata("[1, 2]", MetadataFormat::Json).is_err());
        assert!(parse_metadata("{not json", MetadataFormat::Json).is_err());
        assert!(parse_metadata("<root><a><value>1</value></a>", MetadataFormat::Xml).is_err());
    }

    #[test]
    fn test_failed_coercion_keeps_text() {
        let mut entry = MetadataEntry::new("count", "three");
        entry.type_tag = Some(TypeTag::Int);
        assert_eq!(entry.attr_value(), AttrValue::from("three"));
    }
}
