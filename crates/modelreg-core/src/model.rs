//! Registered models and their versions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// A named, versioned container for model artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredModel {
    /// Globally unique, case-sensitive, immutable name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl RegisteredModel {
    pub fn new(name: &str) -> Self {
        RegisteredModel {
            name: name.to_string(),
            description: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// One immutable snapshot under a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Owning model name.
    pub name: String,
    /// Version number (monotonically increasing, never reused).
    pub version: u32,
    /// Current lifecycle stage.
    #[serde(default)]
    pub stage: Stage,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ModelVersion {
    /// Create a version in stage `None`.
    pub fn new(name: &str, version: u32) -> Self {
        ModelVersion {
            name: name.to_string(),
            version,
            stage: Stage::None,
            description: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }
}

/// A single stage assignment applied as part of a transition batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageUpdate {
    pub version: u32,
    pub stage: Stage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_version_starts_unstaged() {
        let v = ModelVersion::new("m", 1);
        assert_eq!(v.name, "m");
        assert_eq!(v.version, 1);
        assert_eq!(v.stage, Stage::None);
        assert!(v.tags.is_empty());
    }

    #[test]
    fn builders_fill_fields() {
        let v = ModelVersion::new("m", 2)
            .with_stage(Stage::Staging)
            .with_description("candidate")
            .with_tag("framework", "torch");
        assert_eq!(v.stage, Stage::Staging);
        assert_eq!(v.description.as_deref(), Some("candidate"));
        assert_eq!(v.tags.get("framework").map(String::as_str), Some("torch"));
    }

    #[test]
    fn version_deserializes_with_defaults() {
        let v: ModelVersion = serde_json::from_str(r#"{"name":"m","version":4}"#).unwrap();
        assert_eq!(v.stage, Stage::None);
        assert!(v.description.is_none());
    }

    #[test]
    fn model_with_description() {
        let m = RegisteredModel::new("churn").with_description("churn classifier");
        assert_eq!(m.name, "churn");
        assert_eq!(m.description.as_deref(), Some("churn classifier"));
    }
}
