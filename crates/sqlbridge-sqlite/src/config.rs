//! Configuration for the SQLite module.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! blob-policy = "null"        # or "error"
//! expose-query-one = true
//!
//! [identity]
//! name = "SQLite Module"
//! description = "Provides SQLite functionality"
//! author = "sqlbridge contributors"
//! version = "1.0.0-rc.1"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{SqliteModuleError, SqliteResult};

pub const DEFAULT_NAME: &str = "SQLite Module";
pub const DEFAULT_DESCRIPTION: &str = "Provides SQLite functionality";
pub const DEFAULT_AUTHOR: &str = "sqlbridge contributors";
pub const DEFAULT_VERSION: &str = "1.0.0-rc.1";

/// What a BLOB column (or any type the script side cannot represent)
/// becomes when a row is coerced.
///
/// The policy is process-wide for one module instance: every query path
/// applies the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobPolicy {
    /// Coerce to `null`. The bytes are not visible to scripts.
    #[default]
    Null,
    /// Fail the call with an unsupported-type error.
    Error,
}

/// Identity strings reported to the host at load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl Identity {
    /// Identity with every empty field replaced by its default.
    pub fn resolved(&self) -> Identity {
        fn pick(value: &str, default: &str) -> String {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        }

        Identity {
            name: pick(&self.name, DEFAULT_NAME),
            description: pick(&self.description, DEFAULT_DESCRIPTION),
            author: pick(&self.author, DEFAULT_AUTHOR),
            version: pick(&self.version, DEFAULT_VERSION),
        }
    }
}

/// SQLite module configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModuleConfig {
    /// Identity reported at load
    pub identity: Identity,

    /// BLOB coercion policy.
    /// Default: null
    pub blob_policy: BlobPolicy,

    /// Publish `queryOne` on database objects.
    /// Default: true
    pub expose_query_one: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            identity: Identity::default(),
            blob_policy: BlobPolicy::Null,
            expose_query_one: true,
        }
    }
}

impl ModuleConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> SqliteResult<Self> {
        toml::from_str(source).map_err(|e| SqliteModuleError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SqliteResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SqliteModuleError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Set the BLOB coercion policy.
    pub fn blob_policy(mut self, policy: BlobPolicy) -> Self {
        self.blob_policy = policy;
        self
    }

    /// Enable or disable `queryOne`.
    pub fn expose_query_one(mut self, enabled: bool) -> Self {
        self.expose_query_one = enabled;
        self
    }

    /// Replace the identity strings.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }
}
