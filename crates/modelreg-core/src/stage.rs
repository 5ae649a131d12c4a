//! Model version lifecycle stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Lifecycle label attached to a model version.
///
/// Input is matched case-insensitively; the canonical spelling is what
/// gets stored and displayed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Stage {
    /// Not assigned to any stage.
    #[default]
    None,
    /// Being tested/validated.
    Staging,
    /// Deployed and serving traffic.
    Production,
    /// Retired from active use.
    Archived,
}

impl Stage {
    /// All stages, in canonical order.
    pub const ALL: [Stage; 4] = [Stage::None, Stage::Staging, Stage::Production, Stage::Archived];

    /// Canonicalize a raw stage name, ignoring case.
    pub fn parse(raw: &str) -> Result<Stage, RegistryError> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| RegistryError::InvalidStage {
                stage: raw.to_string(),
            })
    }

    /// Canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::None => "None",
            Stage::Staging => "Staging",
            Stage::Production => "Production",
            Stage::Archived => "Archived",
        }
    }
}

impl FromStr for Stage {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::parse(s)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
