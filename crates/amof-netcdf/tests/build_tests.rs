//! Building files from resolved schemas and reading them back.

mod common;

use std::fs;
use std::io::Cursor;

use amof_common::{AttrValue, DataType, DeploymentMode};
use amof_netcdf::{find_placeholders, FileBuilder, NetcdfError, PromptProvider};
use common::*;
use tempfile::tempdir;
use test_utils::*;

#[test]
fn test_build_and_read_back() {
    let dir = tempdir().unwrap();
    let (schema, built) = build_backscatter(dir.path());

    assert_eq!(
        built.path.file_name().unwrap().to_str().unwrap(),
        "ncas-ceilometer-3_cao_20221117_aerosol-backscatter_v1.0.nc"
    );
    assert!(built.path.exists());
    let file = &built.file;

    assert_eq!(file.dimension("time").unwrap().len(), TIME_STEPS);
    assert_eq!(file.dimension("latitude").unwrap().len(), 1);
    assert_eq!(file.dimension("altitude").unwrap().len(), ALTITUDE_GATES);

    let names: Vec<String> = file.variables().map(|v| v.name()).collect();
    let expected: Vec<String> = schema.variables.iter().map(|v| v.name.clone()).collect();
    assert_eq!(names, expected);

    assert_eq!(var_type(file, "time"), DataType::Double);
    assert_eq!(var_type(file, "year"), DataType::Int);
    assert_eq!(var_type(file, "qc_flag"), DataType::Byte);

    let backscatter = "attenuated_aerosol_backscatter_coefficient";
    assert_eq!(
        var_attr(file, backscatter, "_FillValue"),
        Some(AttrValue::Float(-1.0e20_f32 as f64))
    );
    assert_eq!(
        var_attr(file, backscatter, "units"),
        Some(AttrValue::from("m-1 sr-1"))
    );
    assert_eq!(
        var_attr(file, "qc_flag", "flag_values"),
        Some(AttrValue::Ints(vec![0, 1, 2, 3]))
    );
    assert_eq!(
        var_attr(file, "qc_flag", "flag_meanings"),
        Some(AttrValue::from(
            "not_used good_data bad_data_outside_operational_range suspect_data"
        ))
    );

    // Unwritten data reads back as fill
    assert!(values(file, "qc_flag").iter().all(|v| *v == -127.0));

    assert_eq!(
        global_attr(file, "Conventions"),
        Some(AttrValue::from("CF-1.6, NCAS-AMF-2.0.0"))
    );
    assert_eq!(global_attr(file, "platform"), Some(AttrValue::from(FIXED_INSTRUMENT_SITE)));
    assert_eq!(global_attr(file, "deployment_mode"), Some(AttrValue::from("land")));
    assert_eq!(global_attr(file, "instrument_manufacturer"), Some(AttrValue::from("Lufft")));
}

#[test]
fn test_placeholders_survive_in_file() {
    let dir = tempdir().unwrap();
    let (schema, built) = build_backscatter(dir.path());

    let found = find_placeholders(&built.file);
    assert!(found.contains(&"project".to_string()));
    assert!(found.contains(&"time:valid_min".to_string()));
    assert!(!found.contains(&"Conventions".to_string()));
    assert_eq!(found.len(), schema.placeholders().len());
}

#[test]
fn test_missing_length_creates_no_file() {
    let dir = tempdir().unwrap();
    let schema = resolve(&[PRODUCT_BACKSCATTER], DeploymentMode::Land);

    let err = FileBuilder::new(&schema)
        .with_lengths([("time", 4)])
        .build(dir.path(), &names(&schema))
        .err()
        .unwrap();
    match err {
        NetcdfError::DimensionValue { dimension, .. } => assert_eq!(dimension, "altitude"),
        other => panic!("Expected dimension error, got {other:?}"),
    }
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_zero_length_creates_no_file() {
    let dir = tempdir().unwrap();
    let schema = resolve(&[PRODUCT_BACKSCATTER], DeploymentMode::Land);

    let result = FileBuilder::new(&schema)
        .with_lengths([("time", 0), ("altitude", 3)])
        .build(dir.path(), &names(&schema));
    assert!(matches!(result, Err(NetcdfError::DimensionValue { .. })));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_prompted_length() {
    let dir = tempdir().unwrap();
    let schema = resolve(&[PRODUCT_BACKSCATTER], DeploymentMode::Land);

    let built = FileBuilder::new(&schema)
        .with_lengths([("time", 2)])
        .with_provider(PromptProvider::new(Cursor::new("5\n"), Vec::new()))
        .build(dir.path(), &names(&schema))
        .unwrap();
    assert_eq!(built.file.dimension("altitude").unwrap().len(), 5);
}

#[test]
fn test_caller_length_overrides_vocabulary() {
    let dir = tempdir().unwrap();
    let schema = resolve(&[PRODUCT_CLOUD_BASE], DeploymentMode::Land);

    let built = FileBuilder::new(&schema)
        .with_lengths([("time", 2), ("altitude", 2), ("layer_index", 4)])
        .build(dir.path(), &names(&schema))
        .unwrap();
    assert_eq!(built.file.dimension("layer_index").unwrap().len(), 4);
}

#[test]
fn test_sea_file_uses_mode_specific_variables() {
    let dir = tempdir().unwrap();
    let schema = resolve(&[PRODUCT_CLOUD_BASE], DeploymentMode::Sea);

    let built = FileBuilder::new(&schema)
        .with_lengths([("time", 2), ("altitude", 2)])
        .build(dir.path(), &names(&schema))
        .unwrap();
    let file = &built.file;

    assert_eq!(file.dimension("layer_index").unwrap().len(), 3);
    assert!(file.variable("qc_flag_cloud_base").is_none());
    assert_eq!(
        var_attr(file, "cloud_base_altitude", "long_name"),
        Some(AttrValue::from("Cloud Base Altitude (ship motion corrected)"))
    );
    assert_eq!(global_attr(file, "deployment_mode"), Some(AttrValue::from("sea")));
}

#[test]
fn test_missing_directory_is_file_system_error() {
    let dir = tempdir().unwrap();
    let (schema, _built) = build_backscatter(dir.path());

    let result = FileBuilder::new(&schema)
        .with_lengths([("time", 1), ("altitude", 1)])
        .build(&dir.path().join("missing"), &names(&schema));
    assert!(matches!(result, Err(NetcdfError::Netcdf(_))));
}
