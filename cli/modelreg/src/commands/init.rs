//! `modelreg init`: write a default configuration file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use modelreg_core::config::{RegistryConfig, CONFIG_FILE};

/// Create `modelreg.toml` in `dir`. Refuses to overwrite an existing file.
pub fn run(dir: &Path) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::write(&path, RegistryConfig::template())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path()).unwrap();
        let config = RegistryConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.store.root, dir.path().join(".modelreg"));
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path()).unwrap();
        assert!(run(dir.path()).is_err());
    }
}
