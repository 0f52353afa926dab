//! Deployment modes recognised by the AMOF convention.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CommonError;

/// Context an instrument was deployed in.
///
/// Selects which common dimension and variable tables apply: a land
/// deployment has a fixed single-point latitude/longitude, while sea, air
/// and trajectory deployments record position as a function of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Land,
    Sea,
    Air,
    Trajectory,
}

impl DeploymentMode {
    /// All modes, in vocabulary order.
    pub const ALL: [DeploymentMode; 4] = [
        DeploymentMode::Land,
        DeploymentMode::Sea,
        DeploymentMode::Air,
        DeploymentMode::Trajectory,
    ];

    /// Lowercase name as used in table file names and the
    /// `deployment_mode` global attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Land => "land",
            DeploymentMode::Sea => "sea",
            DeploymentMode::Air => "air",
            DeploymentMode::Trajectory => "trajectory",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "land" => Ok(DeploymentMode::Land),
            "sea" => Ok(DeploymentMode::Sea),
            "air" => Ok(DeploymentMode::Air),
            "trajectory" => Ok(DeploymentMode::Trajectory),
            _ => Err(CommonError::UnknownDeploymentMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("LAND".parse::<DeploymentMode>().unwrap(), DeploymentMode::Land);
        assert_eq!(" Sea ".parse::<DeploymentMode>().unwrap(), DeploymentMode::Sea);
        assert_eq!(
            "trajectory".parse::<DeploymentMode>().unwrap(),
            DeploymentMode::Trajectory
        );
    }

    #[test]
    fn test_parse_unknown() {
        let result = "underwater".parse::<DeploymentMode>();
        assert!(matches!(result, Err(CommonError::UnknownDeploymentMode(_))));
    }

    #[test]
    fn test_display_round_trips() {
        for mode in DeploymentMode::ALL {
            assert_eq!(mode.to_string().parse::<DeploymentMode>().unwrap(), mode);
        }
    }
}
