//! Registry error types.

use std::fmt;
use std::path::PathBuf;

/// Why a `models:` URI was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriError {
    /// The scheme is missing or is not `models`.
    SchemeMismatch,
    /// A `%` escape in the path is not followed by two hex digits.
    InvalidEscape,
    /// Nothing follows the scheme (or the path is opaque).
    EmptyPath,
    /// The model name segment is empty.
    EmptyName,
    /// `name/` with nothing after the slash.
    EmptySuffix,
    /// More than two path segments.
    TooManySegments,
    /// A single segment without `@`, or with nothing after it.
    MalformedAlias,
}

impl UriError {
    /// Short description of the rule the URI broke.
    pub fn reason(&self) -> &'static str {
        match self {
            UriError::SchemeMismatch => "scheme must be 'models'",
            UriError::InvalidEscape => "path contains an invalid percent-escape",
            UriError::EmptyPath => "path is empty",
            UriError::EmptyName => "model name is empty",
            UriError::EmptySuffix => "version, stage or 'latest' expected after '/'",
            UriError::TooManySegments => "expected at most two path segments",
            UriError::MalformedAlias => "expected '<name>@<alias>' with a non-empty alias",
        }
    }
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Which alias naming rule was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasRule {
    Empty,
    IllegalCharacters,
    ReservedLatest,
    ReservedVersionPattern,
}

/// Coarse error classification surfaced at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_PARAMETER_VALUE",
            ErrorKind::NotFound => "RESOURCE_DOES_NOT_EXIST",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Malformed `models:` URI.
    #[error("invalid model URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: UriError },

    /// Stage name outside the fixed enumeration.
    #[error(
        "Invalid Model Version stage: {stage}. Value must be one of None, Staging, Production, Archived."
    )]
    InvalidStage { stage: String },

    /// Alias rejected by the naming rules.
    #[error("{message}")]
    InvalidAlias {
        alias: String,
        rule: AliasRule,
        message: String,
    },

    /// Any other malformed or missing input field.
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    /// The registered model does not exist.
    #[error("Registered Model with name={name} not found")]
    ModelNotFound { name: String },

    /// The model exists but has no such version.
    #[error("Model Version (name={name}, version={version}) not found")]
    VersionNotFound { name: String, version: String },

    /// The model exists but no version occupies the stage.
    #[error("no version of model '{name}' is in stage '{stage}'")]
    StageNotFound { name: String, stage: String },

    /// The model exists but the alias is unbound.
    #[error("Registered model alias {alias} not found for model '{name}'")]
    AliasNotFound { name: String, alias: String },

    /// A model with this name is already registered.
    #[error("Registered Model (name={name}) already exists")]
    ModelAlreadyExists { name: String },

    /// Concurrent modification detected by the store.
    #[error("concurrent modification of model '{name}': {detail}")]
    Conflict { name: String, detail: String },

    /// Store-level failure with a location.
    #[error("store error at {path}: {detail}")]
    Store { path: PathBuf, detail: String },

    /// Unreadable or malformed configuration file.
    #[error("configuration error in {path}: {detail}")]
    Config { path: PathBuf, detail: String },

    /// Invariant broken inside the registry itself.
    #[error("internal registry error: {detail}")]
    Internal { detail: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Classify this error into one of the boundary error kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::InvalidUri { .. }
            | RegistryError::InvalidStage { .. }
            | RegistryError::InvalidAlias { .. }
            | RegistryError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            RegistryError::ModelNotFound { .. }
            | RegistryError::VersionNotFound { .. }
            | RegistryError::StageNotFound { .. }
            | RegistryError::AliasNotFound { .. } => ErrorKind::NotFound,
            RegistryError::ModelAlreadyExists { .. } | RegistryError::Conflict { .. } => {
                ErrorKind::Conflict
            }
            RegistryError::Store { .. }
            | RegistryError::Config { .. }
            | RegistryError::Internal { .. }
            | RegistryError::Toml(_)
            | RegistryError::Json(_)
            | RegistryError::Io(_) => ErrorKind::Internal,
        }
    }

    /// True when the model itself is missing, as opposed to a reference
    /// that could not be resolved inside an existing model.
    pub fn is_model_missing(&self) -> bool {
        matches!(self, RegistryError::ModelNotFound { .. })
    }

    pub(crate) fn model_not_found(name: &str) -> Self {
        RegistryError::ModelNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn version_not_found(name: &str, version: impl ToString) -> Self {
        RegistryError::VersionNotFound {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
