//! Alias commands: set-alias, delete-alias.

use anyhow::Result;
use modelreg_core::ModelStore;

/// Run `modelreg set-alias <name> <alias> <version>`.
pub fn set(store: &dyn ModelStore, name: &str, alias: &str, version: u32) -> Result<()> {
    modelreg_core::set_alias(store, name, alias, version)?;
    println!("Alias {alias} -> {name} v{version}");
    Ok(())
}

/// Run `modelreg delete-alias <name> <alias>`.
pub fn delete(store: &dyn ModelStore, name: &str, alias: &str) -> Result<()> {
    modelreg_core::delete_alias(store, name, alias)?;
    println!("Removed alias {alias} from {name}");
    Ok(())
}
