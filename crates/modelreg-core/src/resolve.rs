//! Resolution of parsed model references to concrete versions.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::model::ModelVersion;
use crate::stage::Stage;
use crate::store::ModelStore;
use crate::uri::{self, ModelReference, Selector};

/// Which versions count when resolving `latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LatestPolicy {
    /// Highest version number regardless of stage.
    #[default]
    Any,
    /// Highest version number among versions not in `Archived`.
    ExcludeArchived,
}

/// Resolves [`ModelReference`]s against a store.
///
/// Every path first confirms the model exists, so a missing model is always
/// reported as [`RegistryError::ModelNotFound`] and an unresolved selector as
/// one of the reference-level not-found errors.
pub struct Resolver<'a, S: ModelStore + ?Sized> {
    store: &'a S,
    latest: LatestPolicy,
}

impl<'a, S: ModelStore + ?Sized> Resolver<'a, S> {
    /// Resolver using the default `latest` policy ([`LatestPolicy::Any`]).
    pub fn new(store: &'a S) -> Self {
        Resolver {
            store,
            latest: LatestPolicy::default(),
        }
    }

    pub fn with_latest_policy(mut self, policy: LatestPolicy) -> Self {
        self.latest = policy;
        self
    }

    pub fn latest_policy(&self) -> LatestPolicy {
        self.latest
    }

    /// Parse `uri` and resolve it.
    pub fn resolve_uri(&self, uri: &str) -> Result<ModelVersion> {
        self.resolve(&uri::parse(uri)?)
    }

    /// Resolve a parsed reference to the version it names.
    pub fn resolve(&self, reference: &ModelReference) -> Result<ModelVersion> {
        let name = reference.name.as_str();
        tracing::debug!(reference = %reference, "resolving model reference");
        self.store.get_model(name)?;

        match &reference.selector {
            Selector::Version(raw) => {
                let version = u32::try_from(*raw)
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| RegistryError::version_not_found(name, raw))?;
                self.store.get_version(name, version)
            }
            Selector::Stage(raw) => {
                let stage = Stage::parse(raw)?;
                self.store
                    .get_versions_by_stage(name, stage)?
                    .into_iter()
                    .max_by_key(|v| v.version)
                    .ok_or_else(|| RegistryError::StageNotFound {
                        name: name.to_string(),
                        stage: stage.to_string(),
                    })
            }
            Selector::Alias(alias) => self.store.get_version_by_alias(name, alias),
            Selector::Latest => self.latest_version(name),
        }
    }

    fn latest_version(&self, name: &str) -> Result<ModelVersion> {
        let policy = self.latest;
        self.store
            .get_versions(name)?
            .into_iter()
            .filter(|v| policy == LatestPolicy::Any || v.stage != Stage::Archived)
            .max_by_key(|v| v.version)
            .ok_or_else(|| RegistryError::version_not_found(name, uri::LATEST))
    }
}

/// The highest version in each requested stage.
///
/// Stage names are matched case-insensitively; an empty list means all
/// four stages. Stages with no occupant are omitted. The result is ordered
/// by stage.
pub fn latest_versions<S>(store: &S, name: &str, stages: &[String]) -> Result<Vec<ModelVersion>>
where
    S: ModelStore + ?Sized,
{
    let mut wanted: Vec<Stage> = if stages.is_empty() {
        Stage::ALL.to_vec()
    } else {
        stages
            .iter()
            .map(|s| Stage::parse(s))
            .collect::<Result<_>>()?
    };
    wanted.sort();
    wanted.dedup();

    let versions = store.get_versions(name)?;
    Ok(wanted
        .into_iter()
        .filter_map(|stage| {
            versions
                .iter()
                .filter(|v| v.stage == stage)
                .max_by_key(|v| v.version)
                .cloned()
        })
        .collect())
}
