//! Quality-control flag sets.
//!
//! A QC variable stores indices into an enumerated flag set, written to the
//! file as the `flag_values` / `flag_meanings` attribute pair. The AMOF
//! convention reserves the first two flags: `0 = not_used` and
//! `1 = good_data`. [`QcFlagSet`] cannot be constructed without them.

use serde::{Deserialize, Serialize};

use crate::attr::AttrValue;
use crate::error::{CommonError, CommonResult};

/// Meaning of flag value 0.
pub const NOT_USED: &str = "not_used";
/// Meaning of flag value 1.
pub const GOOD_DATA: &str = "good_data";

/// A single (value, meaning) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcFlag {
    pub value: i64,
    pub meaning: String,
}

impl QcFlag {
    pub fn new(value: i64, meaning: impl Into<String>) -> Self {
        Self {
            value,
            meaning: meaning.into(),
        }
    }
}

/// Ordered flag set whose first two entries are `(0, not_used)` and
/// `(1, good_data)`, with unique, strictly increasing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcFlagSet {
    flags: Vec<QcFlag>,
}

impl QcFlagSet {
    /// Validate and wrap a list of flags.
    pub fn new(flags: Vec<QcFlag>) -> CommonResult<Self> {
        if flags.len() < 2 {
            return Err(CommonError::InvalidFlagSet(format!(
                "expected at least 2 flags ({NOT_USED}, {GOOD_DATA}), got {}",
                flags.len()
            )));
        }
        if flags[0] != QcFlag::new(0, NOT_USED) {
            return Err(CommonError::InvalidFlagSet(format!(
                "first flag must be (0, {NOT_USED}), got ({}, {})",
                flags[0].value, flags[0].meaning
            )));
        }
        if flags[1] != QcFlag::new(1, GOOD_DATA) {
            return Err(CommonError::InvalidFlagSet(format!(
                "second flag must be (1, {GOOD_DATA}), got ({}, {})",
                flags[1].value, flags[1].meaning
            )));
        }
        for pair in flags.windows(2) {
            if pair[1].value <= pair[0].value {
                return Err(CommonError::InvalidFlagSet(format!(
                    "flag values must be unique and increasing: {} follows {}",
                    pair[1].value, pair[0].value
                )));
            }
        }
        if let Some(flag) = flags.iter().find(|f| f.meaning.trim().is_empty()) {
            return Err(CommonError::InvalidFlagSet(format!(
                "flag {} has an empty meaning",
                flag.value
            )));
        }
        Ok(Self { flags })
    }

    /// Build the standard set: `not_used`, `good_data`, then `extra`
    /// meanings numbered contiguously from 2.
    pub fn with_meanings<S: AsRef<str>>(extra: &[S]) -> CommonResult<Self> {
        let mut flags = vec![QcFlag::new(0, NOT_USED), QcFlag::new(1, GOOD_DATA)];
        for (i, meaning) in extra.iter().enumerate() {
            flags.push(QcFlag::new(i as i64 + 2, meaning.as_ref().trim()));
        }
        Self::new(flags)
    }

    /// Parse the vocabulary text form.
    ///
    /// `values` is a comma-separated list that may carry CDL type suffixes
    /// (`0b, 1b, 2b`); `meanings` is whitespace-separated.
    pub fn from_vocabulary(values: &str, meanings: &str) -> CommonResult<Self> {
        let parsed: Vec<i64> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(parse_flag_value)
            .collect::<CommonResult<_>>()?;
        let names: Vec<&str> = meanings.split_whitespace().collect();

        if parsed.len() != names.len() {
            return Err(CommonError::InvalidFlagSet(format!(
                "{} flag values but {} flag meanings",
                parsed.len(),
                names.len()
            )));
        }

        let flags = parsed
            .into_iter()
            .zip(names)
            .map(|(value, meaning)| QcFlag::new(value, meaning))
            .collect();
        Self::new(flags)
    }

    pub fn flags(&self) -> &[QcFlag] {
        &self.flags
    }

    pub fn values(&self) -> Vec<i64> {
        self.flags.iter().map(|f| f.value).collect()
    }

    pub fn meanings(&self) -> Vec<&str> {
        self.flags.iter().map(|f| f.meaning.as_str()).collect()
    }

    /// Whether `value` is one of the declared flag values.
    pub fn contains(&self, value: i64) -> bool {
        self.flags.iter().any(|f| f.value == value)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// `flag_values` attribute value.
    pub fn flag_values_attr(&self) -> AttrValue {
        AttrValue::Ints(self.values())
    }

    /// `flag_meanings` attribute value (space-separated).
    pub fn flag_meanings_attr(&self) -> AttrValue {
        AttrValue::Text(self.meanings().join(" "))
    }
}

/// Parse one flag value, stripping a trailing CDL type suffix.
fn parse_flag_value(raw: &str) -> CommonResult<i64> {
    let digits = raw.trim_end_matches(|c: char| matches!(c, 'b' | 'B' | 's' | 'S' | 'l' | 'L'));
    digits
        .parse::<i64>()
        .map_err(|e| CommonError::InvalidFlagValue {
            value: raw.to_string(),
            message: e.to_string(),
        })
}
