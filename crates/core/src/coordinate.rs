use std::{fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A Maven style `group:artifact:version` triple.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
        }
    }

    /// The `group.artifact` package name used for trigger bookkeeping
    pub fn package(&self) -> String {
        format!("{}.{}", self.group, self.artifact)
    }

    pub fn with_version(&self, version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..self.clone()
        }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let group = parts.next().context(format!("Group not found - {s}"))?;
        let artifact = parts.next().context(format!("Artifact not found - {s}"))?;
        let version = parts.next().context(format!("Version not found - {s}"))?;
        Ok(Self::new(group, artifact, version))
    }
}
