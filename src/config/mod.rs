//! Configuration management for csv-mirror.
//!
//! Settings are read from `csv-mirror.toml` in the archive root, or from the
//! file given with `--config`. Every key is optional; a missing default file
//! means all defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::fetcher::http_fetcher::ClientOptions;
use crate::fetcher::pool::DEFAULT_WORKERS;

pub const CONFIG_FILE_NAME: &str = "csv-mirror.toml";
pub const DEFAULT_CATALOG_FILE: &str = "data-sources.yaml";
pub const DEFAULT_METADATA_FILE: &str = ".metadata.yaml";

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Catalog of directory → URLs, relative to the root
    pub catalog: PathBuf,

    /// Conditional-fetch metadata store, relative to the root
    pub metadata: PathBuf,

    /// Number of concurrent fetch workers (default: 16)
    pub workers: usize,

    /// User agent sent with every request
    pub user_agent: Option<String>,

    /// TCP connect timeout in seconds (default: 30)
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds; unset means none
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from(DEFAULT_CATALOG_FILE),
            metadata: PathBuf::from(DEFAULT_METADATA_FILE),
            workers: DEFAULT_WORKERS,
            user_agent: None,
            connect_timeout_secs: 30,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration for the archive rooted at `root`.
    ///
    /// An explicit `path` must exist. Without one, `<root>/csv-mirror.toml` is
    /// used when present and defaults otherwise.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (root.join(CONFIG_FILE_NAME), false),
        };

        let content = match fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: config_path,
                    source: e,
                })
            }
        };

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn catalog_path(&self, root: &Path) -> PathBuf {
        root.join(&self.catalog)
    }

    pub fn metadata_path(&self, root: &Path) -> PathBuf {
        root.join(&self.metadata)
    }

    pub fn client_options(&self) -> ClientOptions {
        let defaults = ClientOptions::default();
        ClientOptions {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
