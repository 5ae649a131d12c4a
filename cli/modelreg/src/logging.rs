//! Log subscriber setup.

use anyhow::{Context, Result};
use modelreg_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "MODELREG_LOG";

/// Install the global `tracing` subscriber. Logs go to stderr so JSON
/// command output on stdout stays clean.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive)
            .with_context(|| format!("invalid {LOG_ENV} filter '{directive}'"))?,
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("invalid [logging] filter '{}'", config.filter))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if config.json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}
