//! Model version commands: create-version, delete-version, transition,
//! resolve, latest.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use modelreg_core::{LatestPolicy, ModelStore, ModelVersion, NewVersion, Resolver};

/// Parse a `key=value` tag argument.
pub fn parse_tag(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{arg}'")),
    }
}

/// Run `modelreg create-version <name> [--description] [--tag k=v]...`.
pub fn create(
    store: &dyn ModelStore,
    name: &str,
    description: Option<&str>,
    tags: Vec<(String, String)>,
) -> Result<ModelVersion> {
    let new = NewVersion {
        description: description.map(str::to_string),
        tags: tags.into_iter().collect::<BTreeMap<_, _>>(),
    };
    modelreg_core::create_version(store, name, new)
        .with_context(|| format!("creating a version of '{name}'"))
}

/// Run `modelreg delete-version <name> <version>`.
pub fn delete(store: &dyn ModelStore, name: &str, version: u32) -> Result<()> {
    store
        .delete_version(name, version)
        .with_context(|| format!("deleting version {version} of '{name}'"))?;
    tracing::info!(model = name, version, "model version deleted");
    Ok(())
}

/// Run `modelreg transition <name> <version> <stage> [--archive-existing]`.
pub fn transition(
    store: &dyn ModelStore,
    name: &str,
    version: u32,
    stage: &str,
    archive_existing: bool,
) -> Result<ModelVersion> {
    Ok(modelreg_core::transition(
        store,
        name,
        version,
        stage,
        archive_existing,
    )?)
}

/// Run `modelreg resolve <uri>`.
pub fn resolve(store: &dyn ModelStore, policy: LatestPolicy, uri: &str) -> Result<ModelVersion> {
    Ok(Resolver::new(store)
        .with_latest_policy(policy)
        .resolve_uri(uri)?)
}

/// Run `modelreg latest <name> [--stage <stage>]...`.
pub fn latest(store: &dyn ModelStore, name: &str, stages: &[String]) -> Result<Vec<ModelVersion>> {
    Ok(modelreg_core::latest_versions(store, name, stages)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelreg_core::{InMemoryStore, RegisteredModel, Stage};

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.create_model(RegisteredModel::new("m")).unwrap();
        store
    }

    #[test]
    fn parse_tag_arguments() {
        assert_eq!(parse_tag("k=v").unwrap(), ("k".into(), "v".into()));
        assert_eq!(parse_tag("k=a=b").unwrap(), ("k".into(), "a=b".into()));
        assert_eq!(parse_tag("k=").unwrap(), ("k".into(), String::new()));
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=v").is_err());
    }

    #[test]
    fn promote_and_resolve_workflow() {
        let store = store();
        let v1 = create(&store, "m", Some("first"), vec![]).unwrap();
        let v2 = create(&store, "m", None, vec![("team".into(), "ml".into())]).unwrap();
        assert_eq!((v1.version, v2.version), (1, 2));

        transition(&store, "m", 1, "production", false).unwrap();
        transition(&store, "m", 2, "Production", true).unwrap();

        let prod = resolve(&store, LatestPolicy::Any, "models:/m/Production").unwrap();
        assert_eq!(prod.version, 2);
        assert_eq!(store.get_version("m", 1).unwrap().stage, Stage::Archived);

        let stages = latest(&store, "m", &[]).unwrap();
        assert_eq!(stages.len(), 2);
    }

    #[test]
    fn delete_then_resolve_latest() {
        let store = store();
        for _ in 0..3 {
            create(&store, "m", None, vec![]).unwrap();
        }
        delete(&store, "m", 3).unwrap();
        let v = resolve(&store, LatestPolicy::Any, "models:/m/latest").unwrap();
        assert_eq!(v.version, 2);
        assert!(delete(&store, "m", 3).is_err());
    }

    #[test]
    fn transition_error_keeps_message() {
        let store = store();
        create(&store, "m", None, vec![]).unwrap();
        let err = transition(&store, "m", 1, "Promoted", false).unwrap_err();
        assert!(format!("{err:#}").contains("Value must be one of"));
    }
}
