//! Version number allocation.
//!
//! The next version of a model is one past the highest number it has ever
//! been issued, not the count of versions, so numbers freed by deletions
//! (the former maximum included) are never handed out again.

use std::collections::BTreeMap;

use crate::error::{RegistryError, Result};
use crate::model::ModelVersion;
use crate::stage::Stage;
use crate::store::{locked, ModelStore};

/// Compute the next version number: `1` for an empty model, otherwise the
/// maximum existing version plus one.
pub fn next_version(existing: &[ModelVersion]) -> u32 {
    existing
        .iter()
        .map(|v| v.version)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Fields supplied by the caller when creating a version.
#[derive(Debug, Clone, Default)]
pub struct NewVersion {
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// Allocate and persist a new version of `name` under the per-model lock.
///
/// The read of existing versions, the allocation, and the insert happen in
/// one critical section, so concurrent creators never receive the same
/// number.
pub fn create_version<S>(store: &S, name: &str, new: NewVersion) -> Result<ModelVersion>
where
    S: ModelStore + ?Sized,
{
    if name.is_empty() {
        return Err(RegistryError::InvalidArgument {
            detail: "registered model name cannot be empty".to_string(),
        });
    }

    let created = locked(store, name, || {
        let existing = store.get_versions(name)?;
        let issued = store.last_version(name)?;
        let number = next_version(&existing).max(issued.saturating_add(1));
        if number == u32::MAX {
            return Err(RegistryError::InvalidArgument {
                detail: format!("model '{name}' has exhausted its version numbers"),
            });
        }
        let version = ModelVersion {
            name: name.to_string(),
            version: number,
            stage: Stage::None,
            description: new.description,
            tags: new.tags,
        };
        store.insert_version(version.clone())?;
        Ok(version)
    })?;

    tracing::info!(model = name, version = created.version, "created model version");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RegisteredModel;
    use crate::store::InMemoryStore;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn versions(numbers: &[u32]) -> Vec<ModelVersion> {
        numbers.iter().map(|&n| ModelVersion::new("m", n)).collect()
    }

    #[test]
    fn empty_model_starts_at_one() {
        assert_eq!(next_version(&[]), 1);
    }

    #[test]
    fn max_plus_one_not_count() {
        assert_eq!(next_version(&versions(&[1, 2, 3])), 4);
        // Version 2 was deleted; 3 must not be reused.
        assert_eq!(next_version(&versions(&[1, 3])), 4);
        assert_eq!(next_version(&versions(&[7])), 8);
        assert_eq!(next_version(&versions(&[5, 2, 9, 1])), 10);
    }

    #[test]
    fn create_version_assigns_sequential_numbers() {
        let store = InMemoryStore::new();
        store.create_model(RegisteredModel::new("m")).unwrap();
        let v1 = create_version(&store, "m", NewVersion::default()).unwrap();
        let v2 = create_version(&store, "m", NewVersion::default()).unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(v2.stage, Stage::None);
    }

    #[test]
    fn create_version_skips_deletion_gaps() {
        let store = InMemoryStore::new();
        store.create_model(RegisteredModel::new("m")).unwrap();
        for _ in 0..3 {
            create_version(&store, "m", NewVersion::default()).unwrap();
        }
        store.delete_version("m", 1).unwrap();
        store.delete_version("m", 2).unwrap();
        let next = create_version(&store, "m", NewVersion::default()).unwrap();
        assert_eq!(next.version, 4);
    }

    #[test]
    fn create_version_never_reissues_deleted_maximum() {
        let store = InMemoryStore::new();
        store.create_model(RegisteredModel::new("m")).unwrap();
        for _ in 0..3 {
            create_version(&store, "m", NewVersion::default()).unwrap();
        }
        store.delete_version("m", 3).unwrap();
        let next = create_version(&store, "m", NewVersion::default()).unwrap();
        assert_eq!(next.version, 4);

        store.delete_version("m", 4).unwrap();
        store.delete_version("m", 2).unwrap();
        store.delete_version("m", 1).unwrap();
        let next = create_version(&store, "m", NewVersion::default()).unwrap();
        assert_eq!(next.version, 5);
    }

    #[test]
    fn create_version_keeps_metadata() {
        let store = InMemoryStore::new();
        store.create_model(RegisteredModel::new("m")).unwrap();
        let mut tags = BTreeMap::new();
        tags.insert("framework".to_string(), "sklearn".to_string());
        let v = create_version(
            &store,
            "m",
            NewVersion {
                description: Some("baseline".into()),
                tags,
            },
        )
        .unwrap();
        let stored = store.get_version("m", v.version).unwrap();
        assert_eq!(stored.description.as_deref(), Some("baseline"));
        assert_eq!(stored.tags.get("framework").map(String::as_str), Some("sklearn"));
    }

    #[test]
    fn create_version_for_missing_model() {
        let store = InMemoryStore::new();
        let err = create_version(&store, "ghost", NewVersion::default()).unwrap_err();
        assert!(err.is_model_missing());
    }

    #[test]
    fn create_version_rejects_empty_name() {
        let store = InMemoryStore::new();
        let err = create_version(&store, "", NewVersion::default()).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument { .. }));
    }

    #[test]
    fn concurrent_creations_get_distinct_numbers() {
        let store = Arc::new(InMemoryStore::new());
        store.create_model(RegisteredModel::new("m")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..25)
                        .map(|_| {
                            create_version(store.as_ref(), "m", NewVersion::default())
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
        assert_eq!(seen.len(), 200);
        assert_eq!(seen.iter().max(), Some(&200));
    }
}
