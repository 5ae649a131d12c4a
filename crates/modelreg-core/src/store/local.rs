//! Filesystem-backed store.
//!
//! Layout:
//! ```text
//! <root>/
//!   <encoded-model-name>.json         model, versions, aliases, revision
//!   <encoded-model-name>.model.lock   held for `with_model_lock` sections
//!   <encoded-model-name>.write.lock   held for each load-check-write cycle
//! ```
//!
//! Both lock files carry OS advisory locks, so handles in different
//! processes (or several handles in one process) are serialized the same way
//! as threads sharing one handle. A critical section may take the write lock
//! but never the other way around.
//!
//! Documents are written to a uniquely named temp file in the root and then
//! renamed over the old one, so readers never see a half-written model. Each
//! document carries a revision counter checked under the write lock; a
//! mismatch reports [`RegistryError::Conflict`] instead of overwriting
//! another writer's changes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;

use super::record::ModelRecord;
use super::ModelStore;
use crate::error::{RegistryError, Result};
use crate::model::{ModelVersion, RegisteredModel, StageUpdate};
use crate::stage::Stage;

const EXTENSION: &str = "json";
const MODEL_LOCK: &str = "model.lock";
const WRITE_LOCK: &str = "write.lock";

/// A [`ModelStore`] persisting one JSON document per model.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root).map_err(|e| RegistryError::Store {
            path: root.clone(),
            detail: format!("creating store root: {e}"),
        })?;
        Ok(LocalStore { root })
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.sibling_path(name, EXTENSION)
    }

    fn sibling_path(&self, name: &str, suffix: &str) -> PathBuf {
        self.root.join(format!("{}.{suffix}", encode_name(name)))
    }

    fn try_load(&self, name: &str) -> Result<Option<ModelRecord>> {
        let path = self.document_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let record = serde_json::from_str(&data).map_err(|e| RegistryError::Store {
            path,
            detail: format!("corrupt model document: {e}"),
        })?;
        Ok(Some(record))
    }

    fn load(&self, name: &str) -> Result<ModelRecord> {
        self.try_load(name)?
            .ok_or_else(|| RegistryError::model_not_found(name))
    }

    /// Persist `record` if the on-disk revision still equals `expected`
    /// (`None` meaning the document must not exist yet). Callers hold the
    /// model's write lock.
    fn save(&self, mut record: ModelRecord, expected: Option<u64>) -> Result<()> {
        let name = record.model.name.clone();
        let on_disk = self.try_load(&name)?.map(|r| r.revision);
        if on_disk != expected {
            tracing::warn!(
                model = %name,
                expected = ?expected,
                found = ?on_disk,
                "model document changed underneath writer"
            );
            return Err(RegistryError::Conflict {
                name,
                detail: format!(
                    "expected revision {}, found {}",
                    fmt_revision(expected),
                    fmt_revision(on_disk)
                ),
            });
        }

        record.revision = expected.map_or(1, |r| r + 1);
        let path = self.document_path(&name);
        let data = serde_json::to_vec_pretty(&record)?;
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| RegistryError::Store {
            path: self.root.clone(),
            detail: format!("creating temp document: {e}"),
        })?;
        tmp.write_all(&data).map_err(|e| RegistryError::Store {
            path: tmp.path().to_path_buf(),
            detail: format!("writing model document: {e}"),
        })?;
        tmp.persist(&path).map_err(|e| RegistryError::Store {
            path: path.clone(),
            detail: format!("replacing model document: {}", e.error),
        })?;
        Ok(())
    }

    /// Run `f` while holding the exclusive lock file `<name>.<suffix>`.
    fn with_file_lock<T>(
        &self,
        name: &str,
        suffix: &str,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let _lock = FileLock::acquire(self.sibling_path(name, suffix))?;
        tracing::trace!(model = name, lock = suffix, "file lock acquired");
        f()
    }

    fn mutate<T>(&self, name: &str, f: impl FnOnce(&mut ModelRecord) -> Result<T>) -> Result<T> {
        // Keep missing models from leaving lock files behind.
        if !self.document_path(name).is_file() {
            return Err(RegistryError::model_not_found(name));
        }
        self.with_file_lock(name, WRITE_LOCK, || {
            let mut record = self.load(name)?;
            let expected = record.revision;
            let out = f(&mut record)?;
            self.save(record, Some(expected))?;
            Ok(out)
        })
    }
}

/// An exclusive advisory lock on a file, released when dropped.
#[derive(Debug)]
struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| RegistryError::Store {
                path: path.clone(),
                detail: format!("opening lock file: {e}"),
            })?;
        file.lock_exclusive().map_err(|e| RegistryError::Store {
            path: path.clone(),
            detail: format!("locking: {e}"),
        })?;
        Ok(FileLock { file, path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to release lock file"
            );
        }
    }
}

fn fmt_revision(revision: Option<u64>) -> String {
    revision.map_or_else(|| "none".to_string(), |r| r.to_string())
}

/// Map a model name onto a safe file stem: `[A-Za-z0-9_.-]` pass through,
/// everything else becomes `%XX`.
fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

impl ModelStore for LocalStore {
    fn get_model(&self, name: &str) -> Result<RegisteredModel> {
        Ok(self.load(name)?.model)
    }

    fn list_models(&self) -> Result<Vec<RegisteredModel>> {
        let mut models = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let data = std::fs::read_to_string(&path)?;
            let record: ModelRecord =
                serde_json::from_str(&data).map_err(|e| RegistryError::Store {
                    path: path.clone(),
                    detail: format!("corrupt model document: {e}"),
                })?;
            models.push(record.model);
        }
        models.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(models)
    }

    fn create_model(&self, model: RegisteredModel) -> Result<RegisteredModel> {
        let name = model.name.clone();
        if self.document_path(&name).is_file() {
            return Err(RegistryError::ModelAlreadyExists { name });
        }
        self.with_file_lock(&name, WRITE_LOCK, || {
            if self.document_path(&name).is_file() {
                return Err(RegistryError::ModelAlreadyExists { name: name.clone() });
            }
            self.save(ModelRecord::new(model.clone()), None)
        })?;
        Ok(model)
    }

    fn get_versions(&self, name: &str) -> Result<Vec<ModelVersion>> {
        Ok(self.load(name)?.versions())
    }

    fn get_version(&self, name: &str, version: u32) -> Result<ModelVersion> {
        self.load(name)?.version(version)
    }

    fn get_versions_by_stage(&self, name: &str, stage: Stage) -> Result<Vec<ModelVersion>> {
        Ok(self.load(name)?.by_stage(stage))
    }

    fn get_version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion> {
        self.load(name)?.by_alias(alias)
    }

    fn last_version(&self, name: &str) -> Result<u32> {
        Ok(self.load(name)?.last_version())
    }

    fn insert_version(&self, version: ModelVersion) -> Result<()> {
        let name = version.name.clone();
        self.mutate(&name, |r| r.insert(version))
    }

    fn delete_version(&self, name: &str, version: u32) -> Result<()> {
        self.mutate(name, |r| r.delete(version))
    }

    fn set_version_stages(&self, name: &str, updates: &[StageUpdate]) -> Result<()> {
        self.mutate(name, |r| r.apply_stages(updates))
    }

    fn set_alias(&self, name: &str, alias: &str, version: u32) -> Result<()> {
        self.mutate(name, |r| r.set_alias(alias, version))
    }

    fn delete_alias(&self, name: &str, alias: &str) -> Result<()> {
        self.mutate(name, |r| r.delete_alias(alias))
    }

    fn with_model_lock(&self, name: &str, critical: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        if !self.document_path(name).is_file() {
            return Err(RegistryError::model_not_found(name));
        }
        self.with_file_lock(name, MODEL_LOCK, || critical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{create_version, NewVersion};
    use crate::transition::transition_to;
    use std::collections::HashSet;
    use std::thread;

    fn open_temp() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("store")).unwrap();
        (dir, store)
    }

    #[test]
    fn create_and_reload_from_disk() {
        let (dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        store.insert_version(ModelVersion::new("m", 1)).unwrap();
        store.set_version_stage("m", 1, Stage::Staging).unwrap();

        let reopened = LocalStore::open(dir.path().join("store")).unwrap();
        let v = reopened.get_version("m", 1).unwrap();
        assert_eq!(v.stage, Stage::Staging);
    }

    #[test]
    fn reject_duplicate_model() {
        let (_dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        assert!(matches!(
            store.create_model(RegisteredModel::new("m")),
            Err(RegistryError::ModelAlreadyExists { .. })
        ));
    }

    #[test]
    fn names_with_separators_stay_inside_root() {
        let (_dir, store) = open_temp();
        store.create_model(RegisteredModel::new("team/../x y")).unwrap();
        let documents: Vec<_> = std::fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(EXTENSION))
            .collect();
        assert_eq!(documents.len(), 1);
        assert!(!store.root().parent().unwrap().join("x y.json").exists());
        assert_eq!(store.get_model("team/../x y").unwrap().name, "team/../x y");
    }

    #[test]
    fn list_models_sorted() {
        let (_dir, store) = open_temp();
        for name in ["zeta", "alpha", "mid"] {
            store.create_model(RegisteredModel::new(name)).unwrap();
        }
        let names: Vec<String> = store
            .list_models()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn missing_model_reported() {
        let (_dir, store) = open_temp();
        assert!(store.get_versions("ghost").unwrap_err().is_model_missing());
    }

    #[test]
    fn stale_revision_is_a_conflict() {
        let (_dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        let stale = store.load("m").unwrap();

        // Another writer bumps the revision.
        store.insert_version(ModelVersion::new("m", 1)).unwrap();

        let expected = stale.revision;
        let err = store.save(stale, Some(expected)).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
        // The other writer's change survives.
        assert_eq!(store.get_versions("m").unwrap().len(), 1);
    }

    #[test]
    fn failed_batch_leaves_document_unchanged() {
        let (_dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        store.insert_version(ModelVersion::new("m", 1)).unwrap();
        let before = store.load("m").unwrap().revision;

        let err = store
            .set_version_stages(
                "m",
                &[
                    StageUpdate {
                        version: 1,
                        stage: Stage::Production,
                    },
                    StageUpdate {
                        version: 2,
                        stage: Stage::Archived,
                    },
                ],
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::VersionNotFound { .. }));
        assert_eq!(store.get_version("m", 1).unwrap().stage, Stage::None);
        assert_eq!(store.load("m").unwrap().revision, before);
    }

    #[test]
    fn corrupt_document_is_a_store_error() {
        let (_dir, store) = open_temp();
        std::fs::write(store.root().join("m.json"), "{ not json").unwrap();
        assert!(matches!(
            store.get_model("m"),
            Err(RegistryError::Store { .. })
        ));
    }

    #[test]
    fn deleted_maximum_is_not_reissued_after_reopen() {
        let (dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        for _ in 0..3 {
            create_version(&store, "m", NewVersion::default()).unwrap();
        }
        store.delete_version("m", 3).unwrap();

        let reopened = LocalStore::open(dir.path().join("store")).unwrap();
        assert_eq!(reopened.last_version("m").unwrap(), 3);
        let next = create_version(&reopened, "m", NewVersion::default()).unwrap();
        assert_eq!(next.version, 4);
    }

    #[test]
    fn missing_model_leaves_no_lock_files() {
        let (_dir, store) = open_temp();
        assert!(store
            .with_model_lock("ghost", &mut || Ok(()))
            .unwrap_err()
            .is_model_missing());
        assert!(store.set_alias("ghost", "a", 1).unwrap_err().is_model_missing());
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn writes_leave_no_temp_files() {
        let (_dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        for v in 1..=5 {
            store.insert_version(ModelVersion::new("m", v)).unwrap();
        }
        let leftovers: Vec<_> = std::fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| !n.ends_with(".json") && !n.ends_with(".lock"))
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
    }

    #[test]
    fn separate_handles_allocate_distinct_versions() {
        let (dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        let root = dir.path().join("store");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let handle = LocalStore::open(root.clone()).unwrap();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| {
                            create_version(&handle, "m", NewVersion::default())
                                .unwrap()
                                .version
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for v in h.join().unwrap() {
                assert!(seen.insert(v), "version {v} allocated twice");
            }
        }
        let stored = store.get_versions("m").unwrap();
        assert_eq!(seen.len(), 100);
        assert_eq!(stored.len(), 100);
        assert_eq!(stored.last().map(|v| v.version), Some(100));
    }

    #[test]
    fn separate_handles_racing_promotions_leave_one_production_version() {
        let (dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        for v in 1..=12 {
            store.insert_version(ModelVersion::new("m", v)).unwrap();
        }
        let root = dir.path().join("store");

        let handles: Vec<_> = (1..=12)
            .map(|v| {
                let handle = LocalStore::open(root.clone()).unwrap();
                thread::spawn(move || {
                    transition_to(&handle, "m", v, Stage::Production, true).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let production = store.get_versions_by_stage("m", Stage::Production).unwrap();
        assert_eq!(production.len(), 1);
        assert_eq!(store.get_versions_by_stage("m", Stage::Archived).unwrap().len(), 11);
    }

    #[test]
    fn separate_handles_do_not_lose_unlocked_writes() {
        let (dir, store) = open_temp();
        store.create_model(RegisteredModel::new("m")).unwrap();
        store.insert_version(ModelVersion::new("m", 1)).unwrap();
        let root = dir.path().join("store");

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let handle = LocalStore::open(root.clone()).unwrap();
                thread::spawn(move || {
                    for i in 0..10 {
                        handle.set_alias("m", &format!("a{t}-{i}"), 1).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let record = store.load("m").unwrap();
        assert_eq!(record.aliases.len(), 40);
        // One revision for creation, one per insert or alias write.
        assert_eq!(record.revision, 42);
    }

    #[test]
    fn encode_name_escapes_unsafe_bytes() {
        assert_eq!(encode_name("churn-v2.1_a"), "churn-v2.1_a");
        assert_eq!(encode_name("a/b c"), "a%2Fb%20c");
    }
}
