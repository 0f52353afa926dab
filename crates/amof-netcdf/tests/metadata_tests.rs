//! Merging metadata documents in every supported format.

mod common;

use std::fs;
use std::path::Path;

use amof_common::AttrValue;
use amof_netcdf::{MetadataFormat, MetadataMerger, NetcdfError};
use common::*;
use netcdf::FileMut;
use tempfile::tempdir;
use test_utils::*;

const CSV: &str = "\
project,WOEST
title,Lidar, Chilbolton
comment,second line,append=true
latitude,51.1450
longitude,-1.4384
altitude:comment,Range gates
count,12,type=int
";

const JSON: &str = r#"{
  "project": "WOEST",
  "comment": {"value": "second line", "append": true},
  "latitude": 51.1450,
  "longitude": -1.4384,
  "altitude:comment": "Range gates",
  "count": {"value": "12", "type": "int"}
}"#;

const YAML: &str = "\
project: WOEST
comment:
  value: second line
  append: true
latitude: 51.1450
longitude: -1.4384
'altitude:comment': Range gates
count:
  value: 12
  type: int
";

const XML: &str = "\
<root>
  <project><value>WOEST</value></project>
  <comment><value>second line</value><append>true</append></comment>
  <latitude><value>51.1450</value></latitude>
  <longitude><value>-1.4384</value></longitude>
  <count><value>12</value><type>int</type></count>
</root>
";

/// Build a file, write the document next to it and merge it.
fn merge(dir: &Path, file_name: &str, text: &str, format: Option<MetadataFormat>) -> FileMut {
    let (_schema, built) = build_backscatter(dir);
    let mut file = built.file;
    file.add_attribute("comment", "first line").unwrap();

    let source = dir.join(file_name);
    fs::write(&source, text).unwrap();
    MetadataMerger::new()
        .with_geospatial_bounds(true)
        .apply(&mut file, &source, format)
        .unwrap();
    file
}

fn assert_merged(file: &FileMut) {
    assert_eq!(global_attr(file, "project"), Some(AttrValue::from("WOEST")));
    assert_eq!(
        global_attr(file, "comment"),
        Some(AttrValue::from("first line\nsecond line"))
    );
    assert_eq!(global_attr(file, "count"), Some(AttrValue::Int(12)));
    assert_eq!(
        global_attr(file, "geospatial_bounds"),
        Some(AttrValue::from("51.145N -1.4384E"))
    );

    // Location entries become data, not attributes
    assert_approx_eq!(values(file, "latitude")[0], 51.145, 1e-4);
    assert_approx_eq!(values(file, "longitude")[0], -1.4384, 1e-4);
    assert!(file.attribute("latitude").is_none());
}

#[test]
fn test_merge_csv() {
    let dir = tempdir().unwrap();
    let file = merge(dir.path(), "metadata.csv", CSV, None);
    assert_merged(&file);
    assert_eq!(
        var_attr(&file, "altitude", "comment"),
        Some(AttrValue::from("Range gates"))
    );
    assert_eq!(
        global_attr(&file, "title"),
        Some(AttrValue::from("Lidar, Chilbolton"))
    );
}

#[test]
fn test_merge_json() {
    let dir = tempdir().unwrap();
    let file = merge(dir.path(), "metadata.json", JSON, None);
    assert_merged(&file);
    assert_eq!(
        var_attr(&file, "altitude", "comment"),
        Some(AttrValue::from("Range gates"))
    );
}

#[test]
fn test_merge_yaml() {
    let dir = tempdir().unwrap();
    let file = merge(dir.path(), "metadata.yml", YAML, None);
    assert_merged(&file);
    assert_eq!(
        var_attr(&file, "altitude", "comment"),
        Some(AttrValue::from("Range gates"))
    );
}

#[test]
fn test_merge_xml() {
    let dir = tempdir().unwrap();
    let file = merge(dir.path(), "metadata.xml", XML, None);
    assert_merged(&file);
}

#[test]
fn test_unknown_extension_parsed_as_csv() {
    let dir = tempdir().unwrap();
    let file = merge(dir.path(), "metadata.txt", CSV, None);
    assert_merged(&file);
}

#[test]
fn test_explicit_format_overrides_extension() {
    let dir = tempdir().unwrap();
    let file = merge(dir.path(), "metadata.csv", JSON, Some(MetadataFormat::Json));
    assert_merged(&file);
}

#[test]
fn test_merge_errors() {
    let dir = tempdir().unwrap();
    let (_schema, built) = build_backscatter(dir.path());
    let mut file = built.file;
    let merger = MetadataMerger::new();

    let missing_var = dir.path().join("var.csv");
    fs::write(&missing_var, "nope:units,m\n").unwrap();
    let err = merger.apply(&mut file, &missing_var, None).unwrap_err();
    assert!(matches!(err, NetcdfError::VariableNotFound(name) if name == "nope"));

    let malformed = dir.path().join("bad.json");
    fs::write(&malformed, "{\"project\": ").unwrap();
    let err = merger.apply(&mut file, &malformed, None).unwrap_err();
    assert!(matches!(err, NetcdfError::MetadataFormat(_)));

    let bad_latitude = dir.path().join("lat.csv");
    fs::write(&bad_latitude, "latitude,north\n").unwrap();
    let err = merger.apply(&mut file, &bad_latitude, None).unwrap_err();
    assert!(matches!(err, NetcdfError::MetadataFormat(_)));

    let err = merger
        .apply(&mut file, &dir.path().join("absent.csv"), None)
        .unwrap_err();
    assert!(matches!(err, NetcdfError::Io(_)));
}

#[test]
fn test_no_bounds_unless_requested() {
    let dir = tempdir().unwrap();
    let (_schema, built) = build_backscatter(dir.path());
    let mut file = built.file;

    let source = dir.path().join("metadata.csv");
    fs::write(&source, CSV).unwrap();
    MetadataMerger::new().apply(&mut file, &source, None).unwrap();

    // The placeholder from the template is untouched
    let bounds = global_attr(&file, "geospatial_bounds").unwrap();
    assert!(bounds.is_placeholder());
}
