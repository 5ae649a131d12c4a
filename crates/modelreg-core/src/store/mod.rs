//! Storage interface consumed by the core, plus two implementations.
//!
//! The core never holds shared state itself: every model, version, and
//! alias lives behind a [`ModelStore`]. Read-modify-write sequences (version
//! allocation, archiving transitions) run inside [`ModelStore::with_model_lock`]
//! so that two callers working on the same model are serialized.

mod local;
mod locks;
mod memory;
mod record;

pub use local::LocalStore;
pub use memory::InMemoryStore;

use crate::error::{RegistryError, Result};
use crate::model::{ModelVersion, RegisteredModel, StageUpdate};
use crate::stage::Stage;

/// Abstract model store.
///
/// All methods take `&self`; implementations use interior mutability so a
/// single store can be shared across request threads.
pub trait ModelStore: Send + Sync {
    /// Fetch a registered model by name.
    fn get_model(&self, name: &str) -> Result<RegisteredModel>;

    /// List all registered models, sorted by name.
    fn list_models(&self) -> Result<Vec<RegisteredModel>>;

    /// Register a new model. Fails if the name is taken.
    fn create_model(&self, model: RegisteredModel) -> Result<RegisteredModel>;

    /// All versions of a model, ordered by version number.
    fn get_versions(&self, name: &str) -> Result<Vec<ModelVersion>>;

    /// A single version of a model.
    fn get_version(&self, name: &str, version: u32) -> Result<ModelVersion>;

    /// Versions of a model currently in `stage`, ordered by version number.
    fn get_versions_by_stage(&self, name: &str, stage: Stage) -> Result<Vec<ModelVersion>>;

    /// The version an alias is bound to.
    ///
    /// An alias whose version no longer exists is reported as unbound.
    fn get_version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion>;

    /// Highest version number ever stored for a model, counting versions
    /// that have since been deleted. `0` when none was ever stored.
    fn last_version(&self, name: &str) -> Result<u32>;

    /// Persist a newly allocated version. Fails if the number is taken.
    fn insert_version(&self, version: ModelVersion) -> Result<()>;

    /// Hard-delete a version together with every alias bound to it.
    fn delete_version(&self, name: &str, version: u32) -> Result<()>;

    /// Apply a batch of stage changes atomically: either every update is
    /// persisted or none is.
    fn set_version_stages(&self, name: &str, updates: &[StageUpdate]) -> Result<()>;

    /// Bind (or repoint) an alias.
    fn set_alias(&self, name: &str, alias: &str, version: u32) -> Result<()>;

    /// Remove an alias binding.
    fn delete_alias(&self, name: &str, alias: &str) -> Result<()>;

    /// Run `critical` while holding the per-model lock for `name`.
    fn with_model_lock(&self, name: &str, critical: &mut dyn FnMut() -> Result<()>) -> Result<()>;

    /// Convenience for a single stage assignment.
    fn set_version_stage(&self, name: &str, version: u32, stage: Stage) -> Result<()> {
        self.set_version_stages(name, &[StageUpdate { version, stage }])
    }
}

/// Run `f` under the store's per-model lock and hand back its value.
pub fn locked<S, T, F>(store: &S, name: &str, f: F) -> Result<T>
where
    S: ModelStore + ?Sized,
    F: FnOnce() -> Result<T>,
{
    let mut f = Some(f);
    let mut out = None;
    store.with_model_lock(name, &mut || {
        let f = f.take().ok_or_else(|| RegistryError::Internal {
            detail: "model lock callback invoked twice".to_string(),
        })?;
        out = Some(f()?);
        Ok(())
    })?;
    out.ok_or_else(|| RegistryError::Internal {
        detail: format!("model lock for '{name}' did not run its critical section"),
    })
}
