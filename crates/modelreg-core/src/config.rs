//! `modelreg.toml` configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::resolve::LatestPolicy;
use crate::store::{InMemoryStore, LocalStore, ModelStore};

/// Configuration file name searched for by [`RegistryConfig::find_and_load`].
pub const CONFIG_FILE: &str = "modelreg.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which store backs the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    #[default]
    Local,
    Memory,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Store directory for the local backend. Relative paths are taken from
    /// the directory holding the configuration file.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::default(),
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".modelreg")
}

/// `[resolution]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub latest: LatestPolicy,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "warn".to_string()
}

impl RegistryConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration file, resolving a relative store root against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Config {
            path: path.to_path_buf(),
            detail: format!("reading configuration: {e}"),
        })?;
        let mut config = Self::parse(&content).map_err(|e| RegistryError::Config {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if let Some(dir) = path.parent() {
            config.anchor(dir);
        }
        Ok(config)
    }

    /// Search upward from `start_dir` for a `modelreg.toml`, returning the
    /// parsed configuration along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some((Self::load(&candidate)?, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Make a relative store root absolute with respect to `base`.
    pub fn anchor(&mut self, base: &Path) {
        if self.store.root.is_relative() {
            self.store.root = base.join(&self.store.root);
        }
    }

    /// Build the configured store.
    pub fn open_store(&self) -> Result<Box<dyn ModelStore>> {
        Ok(match self.store.backend {
            StoreBackend::Local => Box::new(LocalStore::open(self.store.root.clone())?),
            StoreBackend::Memory => Box::new(InMemoryStore::new()),
        })
    }

    /// Default template written by `modelreg init`.
    pub fn template() -> &'static str {
        r#"[store]
backend = "local"
root = ".modelreg"

[resolution]
# "any" or "exclude-archived"
latest = "any"

[logging]
filter = "warn"
json = false
"#
    }
}
