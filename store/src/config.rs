//! Store configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```
//! let config = kgraph_store::StoreConfig::from_toml_str("").unwrap();
//! assert_eq!(config.default_language, "en");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings shared by every module of a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// URI of the permanent builtin module.
    pub builtin_uri: String,
    /// Separator between a module URI and an entity's short key.
    pub uri_separator: String,
    /// Language used to filter functional-per-language relations.
    pub default_language: String,
    /// Language tags accepted on string literals.
    pub supported_languages: Vec<String>,
    /// Default key reservoir for modules registered without one.
    pub reservoir: ReservoirConfig,
}

/// Range and seed of a key reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirConfig {
    /// Smallest key (inclusive).
    pub min: u32,
    /// Largest key (exclusive).
    pub max: u32,
    /// Shuffle seed.
    pub seed: u64,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            min: 1000,
            max: 9999,
            seed: 1750,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            builtin_uri: "kgraph:/builtins".to_owned(),
            uri_separator: "#".to_owned(),
            default_language: "en".to_owned(),
            supported_languages: vec!["en".to_owned(), "de".to_owned()],
            reservoir: ReservoirConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Parses and validates a configuration from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] if a constraint is violated.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`StoreConfig::from_toml_str`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks the constraints the store relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.builtin_uri.is_empty() {
            return Err(ConfigError::Invalid("builtin_uri must not be empty".to_owned()));
        }
        if self.uri_separator.is_empty() {
            return Err(ConfigError::Invalid("uri_separator must not be empty".to_owned()));
        }
        if self.reservoir.min >= self.reservoir.max {
            return Err(ConfigError::Invalid(format!(
                "reservoir range [{}, {}) is empty",
                self.reservoir.min, self.reservoir.max
            )));
        }
        if !self.supports_language(&self.default_language) {
            return Err(ConfigError::Invalid(format!(
                "default_language `{}` is not listed in supported_languages",
                self.default_language
            )));
        }
        Ok(())
    }

    /// Returns whether `tag` is one of the supported language tags.
    #[must_use]
    pub fn supports_language(&self, tag: &str) -> bool {
        self.supported_languages.iter().any(|l| l == tag)
    }

    /// Joins a module URI and a short key into an entity URI.
    #[must_use]
    pub fn make_uri(&self, module_uri: &str, short_key: &str) -> String {
        format!("{module_uri}{}{short_key}", self.uri_separator)
    }
}
