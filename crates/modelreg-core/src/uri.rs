//! `models:` URI grammar.
//!
//! A model reference names a registered model plus one selector:
//!
//! ```text
//! models:/<name>/<version>     exact version (integer)
//! models:/<name>/latest        highest version (case-insensitive "latest")
//! models:/<name>/<stage>       current occupant of a lifecycle stage
//! models:/<name>@<alias>       version bound to an alias
//! ```
//!
//! Parsing is pure. Stage names are kept verbatim here and only checked
//! against the stage enumeration at resolution time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result, UriError};

/// URI scheme for model references.
pub const SCHEME: &str = "models";

/// Reserved suffix selecting the highest version.
pub const LATEST: &str = "latest";

/// Which version of a model a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Exact version number as written in the URI. Range checks happen on
    /// resolution.
    Version(i64),
    /// Raw, unvalidated stage name.
    Stage(String),
    /// Alias bound with `set_alias`.
    Alias(String),
    /// The latest version under the resolver's policy.
    Latest,
}

/// A parsed model reference. In-memory only, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelReference {
    pub name: String,
    pub selector: Selector,
}

impl ModelReference {
    pub fn version(name: &str, version: i64) -> Self {
        ModelReference {
            name: name.to_string(),
            selector: Selector::Version(version),
        }
    }

    pub fn stage(name: &str, stage: &str) -> Self {
        ModelReference {
            name: name.to_string(),
            selector: Selector::Stage(stage.to_string()),
        }
    }

    pub fn alias(name: &str, alias: &str) -> Self {
        ModelReference {
            name: name.to_string(),
            selector: Selector::Alias(alias.to_string()),
        }
    }

    pub fn latest(name: &str) -> Self {
        ModelReference {
            name: name.to_string(),
            selector: Selector::Latest,
        }
    }

    /// Parse a `models:` URI.
    pub fn parse(uri: &str) -> Result<Self> {
        parse(uri)
    }

    pub fn is_latest(&self) -> bool {
        self.selector == Selector::Latest
    }
}

impl FromStr for ModelReference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Selector::Version(v) => write!(f, "{SCHEME}:/{}/{v}", self.name),
            Selector::Stage(stage) => write!(f, "{SCHEME}:/{}/{stage}", self.name),
            Selector::Alias(alias) => write!(f, "{SCHEME}:/{}@{alias}", self.name),
            Selector::Latest => write!(f, "{SCHEME}:/{}/{LATEST}", self.name),
        }
    }
}

/// Parse a `models:` URI into a [`ModelReference`].
pub fn parse(uri: &str) -> Result<ModelReference> {
    let fail = |reason: UriError| RegistryError::InvalidUri {
        uri: uri.to_string(),
        reason,
    };

    let (scheme, rest) = uri
        .split_once(':')
        .ok_or_else(|| fail(UriError::SchemeMismatch))?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(fail(UriError::SchemeMismatch));
    }

    let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
    let rest = rest.split_once('?').map_or(rest, |(before, _)| before);

    // Only hierarchical forms carry a path; `models:name/1` is opaque.
    let raw_path = if let Some(after_authority) = rest.strip_prefix("//") {
        after_authority
            .find('/')
            .map_or("", |idx| &after_authority[idx..])
    } else if rest.starts_with('/') {
        rest
    } else {
        ""
    };

    let decoded = percent_decode(raw_path).ok_or_else(|| fail(UriError::InvalidEscape))?;
    let path = decoded.trim_start_matches('/');
    if path.is_empty() {
        return Err(fail(UriError::EmptyPath));
    }

    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [name, suffix] => {
            if suffix.is_empty() {
                return Err(fail(UriError::EmptySuffix));
            }
            let selector = if let Ok(version) = suffix.parse::<i64>() {
                Selector::Version(version)
            } else if suffix.eq_ignore_ascii_case(LATEST) {
                Selector::Latest
            } else {
                Selector::Stage((*suffix).to_string())
            };
            Ok(ModelReference {
                name: (*name).to_string(),
                selector,
            })
        }
        [segment] => {
            let (name, alias) = segment
                .split_once('@')
                .ok_or_else(|| fail(UriError::MalformedAlias))?;
            if alias.is_empty() || alias.contains('@') {
                return Err(fail(UriError::MalformedAlias));
            }
            if name.is_empty() {
                return Err(fail(UriError::EmptyName));
            }
            Ok(ModelReference::alias(name, alias))
        }
        _ => Err(fail(UriError::TooManySegments)),
    }
}

/// Decode `%XX` escapes. `None` on a truncated or non-hex escape, or when
/// the decoded bytes are not UTF-8.
fn percent_decode(input: &str) -> Option<String> {
    if !input.contains('%') {
        return Some(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
