//! Registered model commands: create-model, list.

use anyhow::{Context, Result};
use modelreg_core::{ModelStore, ModelVersion, RegisteredModel};
use serde::Serialize;

/// A model together with its versions, as printed by `list <name>`.
#[derive(Debug, Serialize)]
pub struct ModelListing {
    pub model: RegisteredModel,
    pub versions: Vec<ModelVersion>,
}

/// Run `modelreg create-model <name> [--description <text>]`.
pub fn create(
    store: &dyn ModelStore,
    name: &str,
    description: Option<&str>,
) -> Result<RegisteredModel> {
    if name.is_empty() {
        anyhow::bail!("registered model name cannot be empty");
    }
    let mut model = RegisteredModel::new(name);
    model.description = description.map(str::to_string);
    let created = store
        .create_model(model)
        .with_context(|| format!("creating model '{name}'"))?;
    tracing::info!(model = name, "registered model created");
    Ok(created)
}

/// Run `modelreg list [<name>]`: every model, or one model with its versions.
pub fn list(store: &dyn ModelStore, name: Option<&str>) -> Result<serde_json::Value> {
    let value = match name {
        Some(name) => serde_json::to_value(ModelListing {
            model: store.get_model(name)?,
            versions: store.get_versions(name)?,
        })?,
        None => serde_json::to_value(store.list_models()?)?,
    };
    Ok(value)
}
