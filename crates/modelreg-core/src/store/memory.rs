//! In-memory store for tests and embedded use.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::locks::ModelLocks;
use super::record::ModelRecord;
use super::ModelStore;
use crate::error::{RegistryError, Result};
use crate::model::{ModelVersion, RegisteredModel, StageUpdate};
use crate::stage::Stage;

/// A [`ModelStore`] held entirely in process memory.
///
/// Each mutation runs under the write half of a single `RwLock`, which makes
/// batch updates all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    models: RwLock<BTreeMap<String, ModelRecord>>,
    locks: ModelLocks,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, name: &str, f: impl FnOnce(&ModelRecord) -> Result<T>) -> Result<T> {
        let models = self.models.read();
        let record = models
            .get(name)
            .ok_or_else(|| RegistryError::model_not_found(name))?;
        f(record)
    }

    fn write<T>(&self, name: &str, f: impl FnOnce(&mut ModelRecord) -> Result<T>) -> Result<T> {
        let mut models = self.models.write();
        let record = models
            .get_mut(name)
            .ok_or_else(|| RegistryError::model_not_found(name))?;
        let out = f(record)?;
        record.revision += 1;
        Ok(out)
    }
}

impl ModelStore for InMemoryStore {
    fn get_model(&self, name: &str) -> Result<RegisteredModel> {
        self.read(name, |r| Ok(r.model.clone()))
    }

    fn list_models(&self) -> Result<Vec<RegisteredModel>> {
        Ok(self.models.read().values().map(|r| r.model.clone()).collect())
    }

    fn create_model(&self, model: RegisteredModel) -> Result<RegisteredModel> {
        let mut models = self.models.write();
        if models.contains_key(&model.name) {
            return Err(RegistryError::ModelAlreadyExists { name: model.name });
        }
        models.insert(model.name.clone(), ModelRecord::new(model.clone()));
        Ok(model)
    }

    fn get_versions(&self, name: &str) -> Result<Vec<ModelVersion>> {
        self.read(name, |r| Ok(r.versions()))
    }

    fn get_version(&self, name: &str, version: u32) -> Result<ModelVersion> {
        self.read(name, |r| r.version(version))
    }

    fn get_versions_by_stage(&self, name: &str, stage: Stage) -> Result<Vec<ModelVersion>> {
        self.read(name, |r| Ok(r.by_stage(stage)))
    }

    fn get_version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion> {
        self.read(name, |r| r.by_alias(alias))
    }

    fn last_version(&self, name: &str) -> Result<u32> {
        self.read(name, |r| Ok(r.last_version()))
    }

    fn insert_version(&self, version: ModelVersion) -> Result<()> {
        let name = version.name.clone();
        self.write(&name, |r| r.insert(version))
    }

    fn delete_version(&self, name: &str, version: u32) -> Result<()> {
        self.write(name, |r| r.delete(version))
    }

    fn set_version_stages(&self, name: &str, updates: &[StageUpdate]) -> Result<()> {
        self.write(name, |r| r.apply_stages(updates))
    }

    fn set_alias(&self, name: &str, alias: &str, version: u32) -> Result<()> {
        self.write(name, |r| r.set_alias(alias, version))
    }

    fn delete_alias(&self, name: &str, alias: &str) -> Result<()> {
        self.write(name, |r| r.delete_alias(alias))
    }

    fn with_model_lock(&self, name: &str, critical: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        self.locks.run(name, critical)
    }
}
