//! AMOF file naming.
//!
//! `{instrument}_{platform}_{date}_{product(s)}[_{options}]_v{version}.nc`
//!
//! Downstream tooling parses these names, so separators and field order
//! are fixed.

use amof_schema::ResolvedSchema;
use chrono::Utc;

use crate::error::{NetcdfError, NetcdfResult};

/// Product version used when the caller does not give one.
pub const DEFAULT_PRODUCT_VERSION: &str = "1.0";

/// Maximum number of free-form option tokens in a file name.
pub const MAX_OPTIONS: usize = 3;

/// Fields of an AMOF file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameComponents {
    pub instrument: String,
    pub platform: String,
    /// `YYYY[MM[DD[-HH[MM[SS]]]]]`; the current UTC day when `None`.
    pub date: Option<String>,
    pub products: Vec<String>,
    pub options: Vec<String>,
    /// Product version without the leading `v`.
    pub version: String,
}

impl FileNameComponents {
    /// Components for a resolved schema with no date or options and the
    /// default product version.
    pub fn from_schema(schema: &ResolvedSchema) -> Self {
        Self {
            instrument: schema.instrument.clone(),
            platform: schema.platform.clone(),
            date: None,
            products: schema.products.clone(),
            options: Vec::new(),
            version: DEFAULT_PRODUCT_VERSION.to_string(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_options<S: Into<String>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The file name.
    pub fn file_name(&self) -> NetcdfResult<String> {
        self.validate()?;

        let date = match &self.date {
            Some(date) => date.clone(),
            None => Utc::now().format("%Y%m%d").to_string(),
        };
        let version = self.version.trim_start_matches('v');

        let mut parts: Vec<&str> = vec![self.instrument.as_str(), self.platform.as_str(), date.as_str()];
        parts.extend(self.products.iter().map(String::as_str));
        parts.extend(self.options.iter().map(String::as_str));

        Ok(format!("{}_v{}.nc", parts.join("_"), version))
    }

    fn validate(&self) -> NetcdfResult<()> {
        if self.products.is_empty() {
            return Err(NetcdfError::FileName("at least one product is required".into()));
        }
        if self.options.len() > MAX_OPTIONS {
            return Err(NetcdfError::FileName(format!(
                "at most {} options allowed, got {}",
                MAX_OPTIONS,
                self.options.len()
            )));
        }
        if let Some(date) = &self.date {
            if date.is_empty() || !date.chars().all(|c| c.is_ascii_digit() || c == '-') {
                return Err(NetcdfError::FileName(format!("invalid date '{}'", date)));
            }
        }

        let fields = [&self.instrument, &self.platform, &self.version]
            .into_iter()
            .chain(&self.products)
            .chain(&self.options);
        for field in fields {
            if field.is_empty() || field.contains(['_', '/', ' ']) {
                return Err(NetcdfError::FileName(format!(
                    "'{}' must be non-empty and contain no '_', '/' or spaces",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components() -> FileNameComponents {
        FileNameComponents {
            instrument: "ncas-ceilometer-3".into(),
            platform: "cao".into(),
            date: Some("20221117".into()),
            products: vec!["aerosol-backscatter".into()],
            options: Vec::new(),
            version: "1.0".into(),
        }
    }

    #[test]
    fn test_single_product() {
        assert_eq!(
            components().file_name().unwrap(),
            "ncas-ceilometer-3_cao_20221117_aerosol-backscatter_v1.0.nc"
        );
    }

    #[test]
    fn test_multiple_products_options_and_hour() {
        let mut c = components()
            .with_date("20221117-12")
            .with_options(["lowres", "test"])
            .with_version("v2.1");
        c.products.push("cloud-base".into());
        assert_eq!(
            c.file_name().unwrap(),
            "ncas-ceilometer-3_cao_20221117-12_aerosol-backscatter_cloud-base_lowres_test_v2.1.nc"
        );
    }

    #[test]
    fn test_default_date_is_today() {
        let mut c = components();
        c.date = None;
        let today = Utc::now().format("%Y%m%d").to_string();
        assert!(c.file_name().unwrap().contains(&format!("_cao_{}_", today)));
    }

    #[test]
    fn test_rejects_bad_components() {
        assert!(components().with_options(["a", "b", "c", "d"]).file_name().is_err());
        assert!(components().with_date("2022/11/17").file_name().is_err());
        let mut c = components();
        c.platform = "my_site".into();
        assert!(matches!(c.file_name(), Err(NetcdfError::FileName(_))));
        let mut c = components();
        c.products.clear();
        assert!(c.file_name().is_err());
    }
}
