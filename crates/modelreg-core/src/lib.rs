//! Model reference resolution and version lifecycle for a model registry.
//!
//! Registered models own numbered, immutable versions. Each version carries
//! a lifecycle [`Stage`], and aliases give versions human-friendly names.
//! Clients name a version with a `models:` URI:
//!
//! - `models:/<name>/<version>` — an exact version
//! - `models:/<name>/<stage>` — the current occupant of a stage
//! - `models:/<name>@<alias>` — whatever the alias points at
//! - `models:/<name>/latest` — the highest version
//!
//! # Architecture
//!
//! - [`uri`] parses references; [`resolve::Resolver`] turns them into versions.
//! - [`allocator`] hands out version numbers (max existing + 1).
//! - [`transition`] moves versions between stages, optionally archiving the
//!   previous occupants.
//! - [`alias`] enforces alias naming rules.
//! - [`store`] defines the storage interface; all shared state lives there,
//!   and per-model locking serializes read-modify-write sequences.

pub mod alias;
pub mod allocator;
pub mod config;
pub mod error;
pub mod model;
pub mod resolve;
pub mod stage;
pub mod store;
pub mod transition;
pub mod uri;

// Re-exports for convenience.
pub use alias::{delete_alias, set_alias, validate_alias};
pub use allocator::{create_version, next_version, NewVersion};
pub use config::{RegistryConfig, StoreBackend};
pub use error::{AliasRule, ErrorKind, RegistryError, Result, UriError};
pub use model::{ModelVersion, RegisteredModel, StageUpdate};
pub use resolve::{latest_versions, LatestPolicy, Resolver};
pub use stage::Stage;
pub use store::{locked, InMemoryStore, LocalStore, ModelStore};
pub use transition::{transition, transition_to};
pub use uri::{parse as parse_uri, ModelReference, Selector};
