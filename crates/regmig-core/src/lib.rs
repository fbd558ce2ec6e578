use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod registry;
pub mod secret;

pub use registry::{group_by_repo, AuthConfig, DockerConfig, LegacyCredential};
pub use secret::{Secret, DOCKER_CONFIG_SECRET_NAME};

/// Whether the target store keeps a separate identifier sequence for the
/// secrets table that has to be moved past explicitly assigned ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SequenceMode {
    #[default]
    Implicit,
    Explicit,
}

impl SequenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceMode::Implicit => "implicit",
            SequenceMode::Explicit => "explicit",
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, SequenceMode::Explicit)
    }
}

impl fmt::Display for SequenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SequenceMode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "implicit" | "none" => Ok(SequenceMode::Implicit),
            "explicit" | "sequence" => Ok(SequenceMode::Explicit),
            other => Err(format!("Unknown sequence mode: {other}")),
        }
    }
}
