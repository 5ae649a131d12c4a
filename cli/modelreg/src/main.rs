//! modelreg CLI — command-line front end for the model registry.

mod commands;
mod logging;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use modelreg_core::RegistryConfig;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "modelreg", version, about = "Model versioning registry")]
struct Cli {
    /// Configuration file (default: search upward for modelreg.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default modelreg.toml in the current directory
    Init,
    /// Register a new model
    CreateModel {
        /// Model name (case-sensitive, unique)
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Create the next version of a model
    CreateVersion {
        /// Model name
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Version tag as KEY=VALUE (repeatable)
        #[arg(long = "tag", value_parser = commands::versions::parse_tag)]
        tags: Vec<(String, String)>,
    },
    /// List all models, or one model with its versions
    List {
        /// Model name
        name: Option<String>,
    },
    /// Resolve a models:/ URI to a concrete version
    Resolve {
        /// e.g. models:/churn/3, models:/churn/Production, models:/churn@champion
        uri: String,
    },
    /// Move a version to a lifecycle stage
    Transition {
        /// Model name
        name: String,
        /// Version number
        version: u32,
        /// Target stage (None, Staging, Production, Archived)
        stage: String,
        /// Archive other versions currently in the target stage
        #[arg(long)]
        archive_existing: bool,
    },
    /// Show the highest version in each stage
    Latest {
        /// Model name
        name: String,
        /// Restrict to these stages (repeatable)
        #[arg(long = "stage")]
        stages: Vec<String>,
    },
    /// Point an alias at a version
    SetAlias {
        /// Model name
        name: String,
        /// Alias (alphanumerics, '_' and '-')
        alias: String,
        /// Version number
        version: u32,
    },
    /// Remove an alias
    DeleteAlias {
        /// Model name
        name: String,
        /// Alias
        alias: String,
    },
    /// Permanently delete a version and any aliases bound to it
    DeleteVersion {
        /// Model name
        name: String,
        /// Version number
        version: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    if let Commands::Init = cli.command {
        return commands::init::run(&cwd);
    }

    let config = load_config(&cwd, cli.config.as_deref())?;
    logging::init(&config.logging)?;
    let store = config.open_store().context("opening model store")?;
    let store = store.as_ref();

    match cli.command {
        Commands::Init => Ok(()),

        Commands::CreateModel { name, description } => {
            print_json(&commands::models::create(store, &name, description.as_deref())?)
        }

        Commands::CreateVersion {
            name,
            description,
            tags,
        } => print_json(&commands::versions::create(
            store,
            &name,
            description.as_deref(),
            tags,
        )?),

        Commands::List { name } => print_json(&commands::models::list(store, name.as_deref())?),

        Commands::Resolve { uri } => print_json(&commands::versions::resolve(
            store,
            config.resolution.latest,
            &uri,
        )?),

        Commands::Transition {
            name,
            version,
            stage,
            archive_existing,
        } => print_json(&commands::versions::transition(
            store,
            &name,
            version,
            &stage,
            archive_existing,
        )?),

        Commands::Latest { name, stages } => {
            print_json(&commands::versions::latest(store, &name, &stages)?)
        }

        Commands::SetAlias {
            name,
            alias,
            version,
        } => commands::aliases::set(store, &name, &alias, version),

        Commands::DeleteAlias { name, alias } => commands::aliases::delete(store, &name, &alias),

        Commands::DeleteVersion { name, version } => {
            commands::versions::delete(store, &name, version)
        }
    }
}

/// Load the explicit config file, or search upward from `cwd`, or fall
/// back to defaults anchored at `cwd`.
fn load_config(cwd: &Path, explicit: Option<&Path>) -> anyhow::Result<RegistryConfig> {
    if let Some(path) = explicit {
        return RegistryConfig::load(path)
            .with_context(|| format!("loading {}", path.display()));
    }
    match RegistryConfig::find_and_load(cwd)? {
        Some((config, _dir)) => Ok(config),
        None => {
            let mut config = RegistryConfig::default();
            config.anchor(cwd);
            Ok(config)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
