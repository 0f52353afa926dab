//! Writing data, valid ranges, QC checks and time fields.

mod common;

use amof_common::{get_times, AttrValue, QcFlagSet};
use amof_netcdf::{
    apply_time_fields, change_qc_flags, update_variable, update_variable_with, NetcdfError,
    UpdateOptions,
};
use common::*;
use tempfile::tempdir;
use test_utils::*;

const BACKSCATTER: &str = "attenuated_aerosol_backscatter_coefficient";
const CELLS: usize = TIME_STEPS * ALTITUDE_GATES;

#[test]
fn test_update_recomputes_valid_range() {
    let dir = tempdir().unwrap();
    let (_schema, mut built) = build_backscatter(dir.path());

    let mut data = ramp(CELLS, 0.5);
    data[0] = f64::NAN;
    data[1] = -1.0e20;
    update_variable(&mut built.file, BACKSCATTER, &data).unwrap();

    let stored = values(&built.file, BACKSCATTER);
    assert!(stored[0].is_nan());
    assert_approx_eq!(stored[5], 2.5, 1e-6);

    // NaN and fill are excluded from the range
    assert_eq!(var_attr(&built.file, BACKSCATTER, "valid_min"), Some(AttrValue::Float(1.0)));
    assert_eq!(var_attr(&built.file, BACKSCATTER, "valid_max"), Some(AttrValue::Float(5.5)));
}

#[test]
fn test_qc_values_outside_flags_rejected() {
    let dir = tempdir().unwrap();
    let (_schema, mut built) = build_backscatter(dir.path());

    let mut data = vec![1.0; CELLS];
    data[3] = 7.0;
    let err = update_variable(&mut built.file, "qc_flag", &data).unwrap_err();
    match err {
        NetcdfError::QcValue { variable, invalid, allowed } => {
            assert_eq!(variable, "qc_flag");
            assert_eq!(invalid, vec![7.0]);
            assert_eq!(allowed, vec![0, 1, 2, 3]);
        }
        other => panic!("Expected QC error, got {other:?}"),
    }

    // Nothing was written
    assert!(values(&built.file, "qc_flag").iter().all(|v| *v == -127.0));
    // QC variables never get a valid range
    assert_eq!(var_attr(&built.file, "qc_flag", "valid_min"), None);
}

#[test]
fn test_qc_values_written_when_not_strict() {
    let dir = tempdir().unwrap();
    let (_schema, mut built) = build_backscatter(dir.path());

    let mut data = vec![1.0; CELLS];
    data[3] = 7.0;
    let options = UpdateOptions { qc_data_error: false };
    update_variable_with(&mut built.file, "qc_flag", &data, options).unwrap();

    let stored = values(&built.file, "qc_flag");
    assert_eq!(stored[3], 7.0);
    assert_eq!(stored[0], 1.0);
}

#[test]
fn test_update_errors() {
    let dir = tempdir().unwrap();
    let (_schema, mut built) = build_backscatter(dir.path());

    let err = update_variable(&mut built.file, "not_a_variable", &[1.0]).unwrap_err();
    assert!(matches!(err, NetcdfError::VariableNotFound(name) if name == "not_a_variable"));

    let err = update_variable(&mut built.file, BACKSCATTER, &[1.0; 5]).unwrap_err();
    assert!(matches!(
        err,
        NetcdfError::ShapeMismatch { expected: CELLS, actual: 5, .. }
    ));

    let err = update_variable(&mut built.file, "year", &[1.0e12; TIME_STEPS]).unwrap_err();
    assert!(matches!(err, NetcdfError::ValueOutOfRange { .. }));
}

#[test]
fn test_apply_time_fields() {
    let dir = tempdir().unwrap();
    let (_schema, mut built) = build_backscatter(dir.path());

    let times = get_times(&timestamps((2022, 11, 17, 12, 0, 0), 300, TIME_STEPS)).unwrap();
    apply_time_fields(&mut built.file, &times).unwrap();

    let file = &built.file;
    assert_eq!(values(file, "time")[1], 1668686700.0);
    assert_eq!(values(file, "year"), vec![2022.0; TIME_STEPS]);
    assert_eq!(values(file, "minute"), vec![0.0, 5.0, 10.0, 15.0]);
    assert_approx_eq!(values(file, "day_of_year")[0], 321.5, 1e-4);

    // Time itself gets a recomputed range; the components are exempt
    assert_eq!(var_attr(file, "time", "valid_min"), Some(AttrValue::Float(1668686400.0)));
    assert_eq!(var_attr(file, "time", "valid_max"), Some(AttrValue::Float(1668687300.0)));

    assert_eq!(
        global_attr(file, "time_coverage_start"),
        Some(AttrValue::from("2022-11-17T12:00:00"))
    );
    assert_eq!(
        global_attr(file, "time_coverage_end"),
        Some(AttrValue::from("2022-11-17T12:15:00"))
    );
    assert_eq!(times.file_date, "20221117-12");
}

#[test]
fn test_change_qc_flags() {
    let dir = tempdir().unwrap();
    let (_schema, mut built) = build_backscatter(dir.path());

    let flags = QcFlagSet::with_meanings(&["bad_data", "suspect_data", "no_signal"]).unwrap();
    change_qc_flags(&mut built.file, "qc_flag", &flags).unwrap();

    assert_eq!(
        var_attr(&built.file, "qc_flag", "flag_values"),
        Some(AttrValue::Ints(vec![0, 1, 2, 3, 4]))
    );
    assert_eq!(
        var_attr(&built.file, "qc_flag", "flag_meanings"),
        Some(AttrValue::from("not_used good_data bad_data suspect_data no_signal"))
    );

    // The new flag is now accepted
    update_variable(&mut built.file, "qc_flag", &[4.0; CELLS]).unwrap();

    let err = change_qc_flags(&mut built.file, "missing", &flags).unwrap_err();
    assert!(matches!(err, NetcdfError::VariableNotFound(_)));
}

#[test]
fn test_reopen_in_append_mode() {
    let dir = tempdir().unwrap();
    let (_schema, built) = build_backscatter(dir.path());
    let path = built.path.clone();
    drop(built);

    let mut file = netcdf::append(&path).unwrap();
    update_variable(&mut file, "altitude", &ramp(CELLS, 10.0)).unwrap();
    drop(file);

    let file = netcdf::open(&path).unwrap();
    assert_eq!(values(&file, "altitude")[CELLS - 1], 110.0);
    assert_eq!(var_attr(&file, "altitude", "valid_max"), Some(AttrValue::Float(110.0)));
}
