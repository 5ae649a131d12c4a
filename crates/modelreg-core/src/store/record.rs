//! Per-model document shared by the store implementations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::model::{ModelVersion, RegisteredModel, StageUpdate};
use crate::stage::Stage;

/// Everything stored for one registered model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ModelRecord {
    pub model: RegisteredModel,
    /// Bumped on every persisted write; used for optimistic-lock checks.
    #[serde(default)]
    pub revision: u64,
    /// Highest version number ever stored, deleted versions included.
    #[serde(default)]
    pub last_version: u32,
    #[serde(default)]
    pub versions: BTreeMap<u32, ModelVersion>,
    #[serde(default)]
    pub aliases: BTreeMap<String, u32>,
}

impl ModelRecord {
    pub fn new(model: RegisteredModel) -> Self {
        ModelRecord {
            model,
            revision: 0,
            last_version: 0,
            versions: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    fn name(&self) -> &str {
        &self.model.name
    }

    /// The high-water mark, never lower than any live version.
    pub fn last_version(&self) -> u32 {
        self.versions
            .keys()
            .next_back()
            .map_or(self.last_version, |&max| max.max(self.last_version))
    }

    pub fn versions(&self) -> Vec<ModelVersion> {
        self.versions.values().cloned().collect()
    }

    pub fn version(&self, version: u32) -> Result<ModelVersion> {
        self.versions
            .get(&version)
            .cloned()
            .ok_or_else(|| RegistryError::version_not_found(self.name(), version))
    }

    pub fn by_stage(&self, stage: Stage) -> Vec<ModelVersion> {
        self.versions
            .values()
            .filter(|v| v.stage == stage)
            .cloned()
            .collect()
    }

    pub fn by_alias(&self, alias: &str) -> Result<ModelVersion> {
        self.aliases
            .get(alias)
            .and_then(|v| self.versions.get(v))
            .cloned()
            .ok_or_else(|| RegistryError::AliasNotFound {
                name: self.name().to_string(),
                alias: alias.to_string(),
            })
    }

    pub fn insert(&mut self, version: ModelVersion) -> Result<()> {
        if self.versions.contains_key(&version.version) {
            return Err(RegistryError::Conflict {
                name: self.name().to_string(),
                detail: format!("version {} already exists", version.version),
            });
        }
        self.last_version = self.last_version.max(version.version);
        self.versions.insert(version.version, version);
        Ok(())
    }

    pub fn delete(&mut self, version: u32) -> Result<()> {
        if self.versions.remove(&version).is_none() {
            return Err(RegistryError::version_not_found(self.name(), version));
        }
        self.aliases.retain(|_, bound| *bound != version);
        Ok(())
    }

    /// Validate every update before touching anything.
    pub fn apply_stages(&mut self, updates: &[StageUpdate]) -> Result<()> {
        if let Some(missing) = updates
            .iter()
            .find(|u| !self.versions.contains_key(&u.version))
        {
            return Err(RegistryError::version_not_found(self.name(), missing.version));
        }
        for update in updates {
            if let Some(v) = self.versions.get_mut(&update.version) {
                v.stage = update.stage;
            }
        }
        Ok(())
    }

    pub fn set_alias(&mut self, alias: &str, version: u32) -> Result<()> {
        if !self.versions.contains_key(&version) {
            return Err(RegistryError::version_not_found(self.name(), version));
        }
        self.aliases.insert(alias.to_string(), version);
        Ok(())
    }

    pub fn delete_alias(&mut self, alias: &str) -> Result<()> {
        self.aliases
            .remove(alias)
            .map(|_| ())
            .ok_or_else(|| RegistryError::AliasNotFound {
                name: self.name().to_string(),
                alias: alias.to_string(),
            })
    }
}
