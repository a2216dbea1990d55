//! Layered configuration loader

use super::RuntimeConfig;
use crate::error::{Error, Result};
use crate::utils::get_config_dir;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.yaml";

/// Loads [`RuntimeConfig`] from defaults, the config file and the environment
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at the platform config directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_dir: get_config_dir()?,
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Path of the config file this loader reads
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Load runtime configuration with layered precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let path = self.config_path();
        let config = if path.exists() {
            Self::load_yaml_file(&path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            RuntimeConfig::default()
        };

        self.apply_env_overrides(config)
    }

    fn load_yaml_file(path: &Path) -> Result<RuntimeConfig> {
        let content = fs::read_to_string(path)?;
        // An empty file is a valid "all defaults" config
        if content.trim().is_empty() {
            return Ok(RuntimeConfig::default());
        }
        serde_yaml_ng::from_str(&content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("TORIGEN_DATA_DIR") {
            if !val.is_empty() {
                config.data_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = env::var("TORIGEN_CATALOG_URL") {
            if !val.is_empty() {
                config.catalog.url = val;
            }
        }

        if let Ok(val) = env::var("TORIGEN_HTTP_TIMEOUT") {
            config.network.http_timeout_secs = val
                .parse()
                .map_err(|_| Error::invalid_config("TORIGEN_HTTP_TIMEOUT must be a valid number"))?;
        }

        if let Ok(val) = env::var("TORIGEN_DOWNLOAD_TIMEOUT") {
            config.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("TORIGEN_DOWNLOAD_TIMEOUT must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("TORIGEN_LOAD_TIMEOUT") {
            config.loader.load_timeout_secs = val
                .parse()
                .map_err(|_| Error::invalid_config("TORIGEN_LOAD_TIMEOUT must be a valid number"))?;
        }

        Ok(config)
    }
}
