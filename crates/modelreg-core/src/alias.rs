//! Alias naming rules.
//!
//! Aliases share the URI namespace with version numbers and `latest`, so
//! names that would read as either are reserved.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AliasRule, RegistryError, Result};
use crate::store::ModelStore;
use crate::uri::LATEST;

static ALIAS_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]*$").expect("alias charset regex"));

static VERSION_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[vV]\d+$").expect("version alias regex"));

/// Check an alias against the naming rules. The first violated rule wins.
pub fn validate_alias(alias: &str) -> Result<()> {
    let rule = if alias.is_empty() {
        Some(AliasRule::Empty)
    } else if !ALIAS_CHARSET.is_match(alias) {
        Some(AliasRule::IllegalCharacters)
    } else if alias.eq_ignore_ascii_case(LATEST) {
        Some(AliasRule::ReservedLatest)
    } else if VERSION_ALIAS.is_match(alias) {
        Some(AliasRule::ReservedVersionPattern)
    } else {
        None
    };

    match rule {
        None => Ok(()),
        Some(rule) => Err(RegistryError::InvalidAlias {
            alias: alias.to_string(),
            rule,
            message: message(alias, rule),
        }),
    }
}

/// Validate `alias` and bind it to `version` of `name`, repointing it if it
/// already exists. The version must exist.
pub fn set_alias<S>(store: &S, name: &str, alias: &str, version: u32) -> Result<()>
where
    S: ModelStore + ?Sized,
{
    if name.is_empty() {
        return Err(RegistryError::InvalidArgument {
            detail: "registered model name cannot be empty".to_string(),
        });
    }
    validate_alias(alias)?;
    store.set_alias(name, alias, version)?;
    tracing::info!(model = name, alias, version, "alias set");
    Ok(())
}

/// Remove an alias binding.
pub fn delete_alias<S>(store: &S, name: &str, alias: &str) -> Result<()>
where
    S: ModelStore + ?Sized,
{
    store.delete_alias(name, alias)?;
    tracing::info!(model = name, alias, "alias deleted");
    Ok(())
}

fn message(alias: &str, rule: AliasRule) -> String {
    match rule {
        AliasRule::Empty => "Registered model alias name cannot be empty.".to_string(),
        AliasRule::IllegalCharacters => format!(
            "Invalid alias name: {alias}. Names may only contain alphanumerics, underscores (_), and dashes (-)."
        ),
        AliasRule::ReservedLatest => format!(
            "Alias name '{alias}' is reserved: 'latest' (case insensitive) selects the newest version."
        ),
        AliasRule::ReservedVersionPattern => format!("Version alias name '{alias}' is reserved."),
    }
}
