//! A synthetic vocabulary tree for tests.
//!
//! The tree follows the repository layout exactly, so it can be read with
//! a local mirror. Contents are small but cover the cases the resolver has
//! to get right:
//!
//! - a fixed-site instrument ([`FIXED_INSTRUMENT`]) with two products, and a
//!   mobile one ([`MOBILE_INSTRUMENT`]) with no platform default;
//! - a community vocabulary that repeats an NCAS instrument id;
//! - two products ([`PRODUCT_BACKSCATTER`], [`PRODUCT_CLOUD_BASE`]) that both
//!   declare the `altitude` dimension and variable, each with a QC variable;
//! - a cloud-base table that redeclares the common `time` dimension and
//!   `latitude` variable with different definitions;
//! - a mode-specific variable table for the cloud-base product at sea;
//! - land and sea common tables, no air or trajectory tables;
//! - a listed product ([`PRODUCT_UNDEFINED`]) without any definition files.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Vocabulary version written by [`VocabFixture::new`].
pub const VERSION: &str = "v2.0.0";

pub const FIXED_INSTRUMENT: &str = "ncas-ceilometer-3";
pub const FIXED_INSTRUMENT_SITE: &str = "cao";
pub const MOBILE_INSTRUMENT: &str = "ncas-aws-10";
pub const COMMUNITY_INSTRUMENT: &str = "community-lidar-1";

pub const PRODUCT_BACKSCATTER: &str = "aerosol-backscatter";
pub const PRODUCT_CLOUD_BASE: &str = "cloud-base";
pub const PRODUCT_UNDEFINED: &str = "surface-met";

/// Common variables of the land tables, in declaration order.
pub const LAND_COMMON_VARIABLES: &[&str] = &[
    "time",
    "latitude",
    "longitude",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "day_of_year",
];

/// Join rows into tab-separated text with a trailing newline.
pub fn tsv(rows: &[&[&str]]) -> String {
    let mut text = String::new();
    for row in rows {
        text.push_str(&row.join("\t"));
        text.push('\n');
    }
    text
}

/// Variable table text in the `Variable / Attribute / Value` layout.
pub fn variables_tsv(variables: &[(&str, &[(&str, &str)])]) -> String {
    let mut rows: Vec<Vec<&str>> = vec![vec!["Variable", "Attribute", "Value"]];
    for (name, attributes) in variables {
        rows.push(vec![*name, "", ""]);
        for (attr, value) in attributes.iter() {
            rows.push(vec!["", *attr, *value]);
        }
    }
    let refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    tsv(&refs)
}

/// A vocabulary tree in a temporary directory, removed on drop.
pub struct VocabFixture {
    dir: TempDir,
}

impl VocabFixture {
    /// Write the full synthetic tree.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let fixture = Self { dir };
        fixture.write_all();
        fixture
    }

    /// Root to pass as the local mirror path.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a table relative to the versioned TSV directory.
    pub fn table_path(&self, relative: &str) -> PathBuf {
        self.root()
            .join(VERSION)
            .join("product-definitions/tsv")
            .join(relative)
    }

    /// Write (or overwrite) a table relative to the versioned TSV directory.
    pub fn write(&self, relative: &str, text: &str) {
        let path = self.table_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, text).expect("Failed to write fixture table");
    }

    /// Remove a table relative to the versioned TSV directory.
    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.table_path(relative)).expect("Failed to remove fixture table");
    }

    fn write_all(&self) {
        self.write("_common/global-attributes.tsv", &global_attributes());
        self.write("_common/dimensions-land.tsv", &tsv(&[
            &["Name", "Length", "units"],
            &["time", "<n>", "1"],
            &["latitude", "1", "degree_north"],
            &["longitude", "1", "degree_east"],
        ]));
        self.write("_common/variables-land.tsv", &land_variables());
        self.write("_common/dimensions-sea.tsv", &tsv(&[
            &["Name", "Length", "units"],
            &["time", "<n>", "1"],
        ]));
        self.write("_common/variables-sea.tsv", &sea_variables());

        self.write("_vocabularies/data-products.tsv", &tsv(&[
            &["Data Product", "Description"],
            &[PRODUCT_BACKSCATTER, "Attenuated aerosol backscatter profiles"],
            &[PRODUCT_CLOUD_BASE, "Cloud base altitudes"],
            &[PRODUCT_UNDEFINED, "Surface meteorology"],
        ]));

        self.write(
            "_instrument_vocabs/ncas-instrument-name-and-descriptors.tsv",
            &tsv(&[
                &["New Instrument Name", "Descriptor", "Data Product(s)", "Manufacturer", "Model No.", "Serial Number", "Mobile/Fixed (loc)"],
                &[FIXED_INSTRUMENT, "NCAS Lufft CHM15k ceilometer unit 3", "aerosol-backscatter | cloud-base", "Lufft", "CHM15k", "TH123", "fixed - cao"],
                &[MOBILE_INSTRUMENT, "NCAS Automatic Weather Station unit 10", "surface-met", "Campbell Scientific", "CR1000X", "", "mobile"],
            ]),
        );
        self.write(
            "_instrument_vocabs/community-instrument-name-and-descriptors.tsv",
            &tsv(&[
                &["New Instrument Name", "Descriptor", "Data Product(s)", "Manufacturer", "Model No.", "Serial Number", "Mobile/Fixed (loc)"],
                &[COMMUNITY_INSTRUMENT, "University lidar", "aerosol-backscatter", "Halo Photonics", "StreamLine", "42", "fixed - chilbolton"],
                &[FIXED_INSTRUMENT, "Community duplicate", "cloud-base", "Other", "Other", "0", "mobile"],
            ]),
        );

        self.write(
            "aerosol-backscatter/dimensions-specific.tsv",
            &tsv(&[&["Name", "Length", "units"], &["altitude", "<n>", "m"]]),
        );
        self.write("aerosol-backscatter/variables-specific.tsv", &backscatter_variables());
        self.write(
            "aerosol-backscatter/global-attributes-specific.tsv",
            &tsv(&[
                &["Name", "Description", "Example", "Fixed Value", "Compliance checking rules", "Convention Providence"],
                &["title", "Product specific title", "Should not be used", "", "String", "NCAS"],
                &["laser_wavelength", "Wavelength of the laser", "1064 nm", "", "String", "NCAS"],
            ]),
        );

        self.write(
            "cloud-base/dimensions-specific.tsv",
            &tsv(&[
                &["Name", "Length", "units"],
                &["time", "24", "1"],
                &["altitude", "<n>", "m"],
                &["layer_index", "3", "1"],
            ]),
        );
        self.write("cloud-base/variables-specific.tsv", &cloud_base_variables());
        self.write("cloud-base/variables-specific-sea.tsv", &cloud_base_sea_variables());
    }
}

impl Default for VocabFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn global_attributes() -> String {
    tsv(&[
        &["Name", "Description", "Example", "Fixed Value", "Compliance checking rules", "Convention Providence"],
        &["Conventions", "Conventions used", "CF-1.6, NCAS-AMF-2.0.0", "CF-1.6, NCAS-AMF-2.0.0", "Exact match", "CF"],
        &["source", "Name of instrument", "NCAS Lufft CHM15k ceilometer unit 3", "", "String", "CF"],
        &["instrument_manufacturer", "Manufacturer of the instrument", "Lufft", "", "String", "NCAS"],
        &["instrument_model", "Model number of the instrument", "CHM15k", "", "String", "NCAS"],
        &["instrument_serial_number", "Serial number of the instrument", "TH123", "", "String", "NCAS"],
        &["title", "Title of the file", "ncas-ceilometer-3 aerosol backscatter", "", "String", "CF"],
        &["project", "Name of project", "WOEST", "", "String", "NCAS"],
        &["platform", "Measurement platform", "cao", "", "String", "NCAS"],
        &["deployment_mode", "Deployment mode", "land", "", "One of land, sea, air, trajectory", "NCAS"],
        &["time_coverage_start", "Start of data", "2022-11-17T00:00:00", "", "ISO date", "ACDD"],
        &["time_coverage_end", "End of data", "2022-11-17T23:59:59", "", "ISO date", "ACDD"],
        &["geospatial_bounds", "Location of data", "51.1450N -1.4384E", "", "String", "ACDD"],
        &["product_version", "Version of the dataset", "v1.0", "", "String", "NCAS"],
    ])
}

const DERIVED: &str = "<derived from file>";

fn time_component(dtype: &'static str, units: &'static str, long_name: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("type", dtype),
        ("dimension", "time"),
        ("units", units),
        ("long_name", long_name),
    ]
}

fn land_variables() -> String {
    let time: &[(&str, &str)] = &[
        ("type", "float64"),
        ("dimension", "time"),
        ("units", "seconds since 1970-01-01 00:00:00"),
        ("standard_name", "time"),
        ("long_name", "Time (seconds since 1970-01-01 00:00:00)"),
        ("axis", "T"),
        ("valid_min", DERIVED),
        ("valid_max", DERIVED),
        ("calendar", "standard"),
    ];
    let latitude: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "latitude"),
        ("units", "degree_north"),
        ("standard_name", "latitude"),
        ("long_name", "Latitude"),
    ];
    let longitude: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "longitude"),
        ("units", "degree_east"),
        ("standard_name", "longitude"),
        ("long_name", "Longitude"),
    ];
    let year = time_component("int", "1", "Year");
    let month = time_component("int", "1", "Month");
    let day = time_component("int", "1", "Day");
    let hour = time_component("int", "1", "Hour");
    let minute = time_component("int", "1", "Minute");
    let second = time_component("float32", "1", "Second");
    let day_of_year = time_component("float32", "1", "Day of Year");

    variables_tsv(&[
        ("time", time),
        ("latitude", latitude),
        ("longitude", longitude),
        ("year", year.as_slice()),
        ("month", month.as_slice()),
        ("day", day.as_slice()),
        ("hour", hour.as_slice()),
        ("minute", minute.as_slice()),
        ("second", second.as_slice()),
        ("day_of_year", day_of_year.as_slice()),
    ])
}

fn sea_variables() -> String {
    let time: &[(&str, &str)] = &[
        ("type", "float64"),
        ("dimension", "time"),
        ("units", "seconds since 1970-01-01 00:00:00"),
        ("standard_name", "time"),
    ];
    let latitude: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "time"),
        ("units", "degree_north"),
        ("valid_min", DERIVED),
        ("valid_max", DERIVED),
    ];
    let longitude: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "time"),
        ("units", "degree_east"),
        ("valid_min", DERIVED),
        ("valid_max", DERIVED),
    ];
    variables_tsv(&[("time", time), ("latitude", latitude), ("longitude", longitude)])
}

fn backscatter_variables() -> String {
    let backscatter: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "time, altitude"),
        ("_FillValue", "-1.00E+20"),
        ("units", "m-1 sr-1"),
        ("long_name", "Attenuated Aerosol Backscatter Coefficient"),
        ("valid_min", DERIVED),
        ("valid_max", DERIVED),
        ("cell_methods", "time: mean"),
    ];
    let altitude: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "time, altitude"),
        ("_FillValue", "-1.00E+20"),
        ("units", "m"),
        ("long_name", "Geometric height above geoid (WGS84)"),
        ("standard_name", "altitude"),
        ("valid_min", DERIVED),
        ("valid_max", DERIVED),
    ];
    let qc: &[(&str, &str)] = &[
        ("type", "byte"),
        ("dimension", "time, altitude"),
        ("_FillValue", "-127b"),
        ("units", "1"),
        ("long_name", "Data Quality flag"),
        ("flag_values", "0b, 1b, 2b, 3b"),
        ("flag_meanings", "not_used good_data bad_data_outside_operational_range suspect_data"),
    ];
    variables_tsv(&[
        ("attenuated_aerosol_backscatter_coefficient", backscatter),
        ("altitude", altitude),
        ("qc_flag", qc),
    ])
}

fn cloud_base_variables() -> String {
    let cloud_base: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "time, layer_index"),
        ("_FillValue", "-1.00E+20"),
        ("units", "m"),
        ("long_name", "Cloud Base Altitude"),
        ("valid_min", DERIVED),
        ("valid_max", DERIVED),
    ];
    let altitude: &[(&str, &str)] = &[
        ("type", "float64"),
        ("dimension", "altitude"),
        ("units", "km"),
        ("long_name", "Cloud-base product altitude"),
    ];
    let qc: &[(&str, &str)] = &[
        ("type", "byte"),
        ("dimension", "time"),
        ("_FillValue", "-127b"),
        ("units", "1"),
        ("long_name", "Data Quality flag: Cloud Base"),
        ("flag_values", "0b, 1b, 2b"),
        ("flag_meanings", "not_used good_data no_cloud_detected"),
    ];
    // Redeclares a common variable; the common definition must win.
    let latitude: &[(&str, &str)] = &[
        ("type", "float64"),
        ("dimension", "latitude"),
        ("units", "degrees"),
        ("long_name", "Cloud-base product latitude"),
    ];
    variables_tsv(&[
        ("cloud_base_altitude", cloud_base),
        ("latitude", latitude),
        ("altitude", altitude),
        ("qc_flag_cloud_base", qc),
    ])
}

fn cloud_base_sea_variables() -> String {
    let cloud_base: &[(&str, &str)] = &[
        ("type", "float32"),
        ("dimension", "time, layer_index"),
        ("_FillValue", "-1.00E+20"),
        ("units", "m"),
        ("long_name", "Cloud Base Altitude (ship motion corrected)"),
    ];
    variables_tsv(&[("cloud_base_altitude", cloud_base)])
}
