//! Stage transitions.
//!
//! Moving a version into a stage can optionally archive every other version
//! of the same model that currently sits in that stage. The occupant scan and
//! the stage writes run inside the per-model lock and are persisted as one
//! batch, so racing transitions cannot leave two versions in a stage that
//! archiving is meant to keep exclusive.

use crate::error::Result;
use crate::model::{ModelVersion, StageUpdate};
use crate::stage::Stage;
use crate::store::{locked, ModelStore};

/// Move `version` of `name` into `target_stage`.
///
/// `target_stage` is matched case-insensitively against the four stages.
/// With `archive_existing`, every *other* version currently in the target
/// stage is moved to [`Stage::Archived`] in the same batch. Transitioning to
/// the stage a version already holds succeeds and still archives the others.
pub fn transition<S>(
    store: &S,
    name: &str,
    version: u32,
    target_stage: &str,
    archive_existing: bool,
) -> Result<ModelVersion>
where
    S: ModelStore + ?Sized,
{
    let target = Stage::parse(target_stage)?;
    transition_to(store, name, version, target, archive_existing)
}

/// Typed form of [`transition`] for callers that already hold a [`Stage`].
pub fn transition_to<S>(
    store: &S,
    name: &str,
    version: u32,
    target: Stage,
    archive_existing: bool,
) -> Result<ModelVersion>
where
    S: ModelStore + ?Sized,
{
    let (previous, archived, updated) = locked(store, name, || {
        let current = store.get_version(name, version)?;

        let mut updates: Vec<StageUpdate> = Vec::new();
        if archive_existing && target != Stage::Archived {
            updates.extend(
                store
                    .get_versions_by_stage(name, target)?
                    .into_iter()
                    .filter(|other| other.version != version)
                    .map(|other| StageUpdate {
                        version: other.version,
                        stage: Stage::Archived,
                    }),
            );
        }
        let archived: Vec<u32> = updates.iter().map(|u| u.version).collect();
        updates.push(StageUpdate {
            version,
            stage: target,
        });

        store.set_version_stages(name, &updates)?;
        let updated = store.get_version(name, version)?;
        Ok((current.stage, archived, updated))
    })?;

    if !archived.is_empty() {
        tracing::info!(
            model = name,
            versions = ?archived,
            stage = %target,
            "archived existing versions"
        );
    }
    tracing::info!(
        model = name,
        version,
        from = %previous,
        to = %target,
        "transitioned model version"
    );
    Ok(updated)
}
