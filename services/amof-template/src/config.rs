//! Configuration for the command-line tool.
//!
//! Settings come from, in order of precedence: command-line flags, their
//! environment variables (`AMOF_VOCAB_URL`, `AMOF_VOCAB_VERSION`,
//! `AMOF_VOCAB_PATH`, usually via `.env`), an optional YAML file given with
//! `--config`, and built-in defaults.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use amof_netcdf::DEFAULT_PRODUCT_VERSION;
use amof_vocab::DEFAULT_VOCAB_URL;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::cli::VocabArgs;

/// Vocabulary version used when none is configured.
pub const DEFAULT_VOCAB_VERSION: &str = "v2.0.0";

/// Contents of a `--config` YAML file. Every field is optional.
///
/// ```yaml
/// vocab_version: v2.0.0
/// vocab_path: /data/AMF_CVs
/// output_dir: /data/amof
/// product_version: "1.1"
/// dimension_lengths:
///   time: 1440
///   altitude: 1024
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub vocab_url: Option<String>,
    pub vocab_version: Option<String>,
    pub vocab_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub product_version: Option<String>,
    pub dimension_lengths: HashMap<String, usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Effective settings after merging flags, environment, file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub vocab_url: String,
    pub vocab_version: String,
    pub vocab_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub product_version: String,
    pub dimension_lengths: HashMap<String, usize>,
}

impl Settings {
    pub fn resolve(args: &VocabArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let settings = Self::merge(args, file);
        debug!(
            vocab_url = %settings.vocab_url,
            vocab_version = %settings.vocab_version,
            vocab_path = ?settings.vocab_path,
            "Resolved settings"
        );
        Ok(settings)
    }

    fn merge(args: &VocabArgs, file: FileConfig) -> Self {
        Self {
            vocab_url: args
                .vocab_url
                .clone()
                .or(file.vocab_url)
                .unwrap_or_else(|| DEFAULT_VOCAB_URL.to_string()),
            vocab_version: args
                .vocab_version
                .clone()
                .or(file.vocab_version)
                .unwrap_or_else(|| DEFAULT_VOCAB_VERSION.to_string()),
            vocab_path: args.vocab_path.clone().or(file.vocab_path),
            output_dir: file.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            product_version: file
                .product_version
                .unwrap_or_else(|| DEFAULT_PRODUCT_VERSION.to_string()),
            dimension_lengths: file.dimension_lengths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> VocabArgs {
        VocabArgs {
            vocab_url: None,
            vocab_version: None,
            vocab_path: None,
            config: None,
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::merge(&no_args(), FileConfig::default());
        assert_eq!(settings.vocab_url, DEFAULT_VOCAB_URL);
        assert_eq!(settings.vocab_version, DEFAULT_VOCAB_VERSION);
        assert_eq!(settings.product_version, "1.0");
        assert!(settings.vocab_path.is_none());
    }

    #[test]
    fn test_flags_override_file() {
        let file: FileConfig = serde_yaml::from_str(
            "vocab_version: v1.0.0\nvocab_path: /mirror\ndimension_lengths:\n  time: 10\n",
        )
        .unwrap();
        let mut args = no_args();
        args.vocab_version = Some("v2.1.0".into());

        let settings = Settings::merge(&args, file);
        assert_eq!(settings.vocab_version, "v2.1.0");
        assert_eq!(settings.vocab_path, Some(PathBuf::from("/mirror")));
        assert_eq!(settings.dimension_lengths["time"], 10);
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        assert!(serde_yaml::from_str::<FileConfig>("vocab_verison: v1\n").is_err());
    }
}
