//! Dimension lengths as declared by the vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a dimension at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionLength {
    /// Fixed by the vocabulary (e.g. a single-point latitude at a land site).
    Fixed(usize),
    /// Record dimension that grows as data is written.
    Unlimited,
    /// Not known until the file is built; supplied by the caller or prompted for.
    Open,
}

impl DimensionLength {
    /// Parse the `Length` column of a dimension table.
    ///
    /// Positive integers are fixed, `unlimited` is a record dimension, and
    /// anything else (`<n>`, blank, free text) is left open.
    pub fn from_vocabulary(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("unlimited") {
            return DimensionLength::Unlimited;
        }
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => DimensionLength::Fixed(n),
            _ => DimensionLength::Open,
        }
    }

    pub fn fixed(&self) -> Option<usize> {
        match self {
            DimensionLength::Fixed(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for DimensionLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionLength::Fixed(n) => write!(f, "{n}"),
            DimensionLength::Unlimited => f.write_str("unlimited"),
            DimensionLength::Open => f.write_str("<n>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vocabulary() {
        assert_eq!(DimensionLength::from_vocabulary("1"), DimensionLength::Fixed(1));
        assert_eq!(DimensionLength::from_vocabulary("UNLIMITED"), DimensionLength::Unlimited);
        assert_eq!(DimensionLength::from_vocabulary("<n>"), DimensionLength::Open);
        assert_eq!(DimensionLength::from_vocabulary(""), DimensionLength::Open);
        assert_eq!(DimensionLength::from_vocabulary("0"), DimensionLength::Open);
    }
}
