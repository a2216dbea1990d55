//! Runtime configuration types
//!
//! These control where extension state lives, where the remote catalog is
//! fetched from, and how long network fetches and provider loads may take.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::utils::get_data_dir;

/// Default remote source catalog location
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/Torigen-manga/sources/refs/heads/main/sources.json";

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Version compared against a catalog entry's `minAppVersion`
    #[serde(default = "default_app_version")]
    pub app_version: String,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub loader: LoaderConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            app_version: default_app_version(),
            catalog: CatalogConfig::default(),
            network: NetworkConfig::default(),
            loader: LoaderConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Data directory to use, honouring the override
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_data_dir(),
        }
    }
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Remote source catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,

    /// How long an in-memory catalog is served before refetching
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl CatalogConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Upper bound for a whole download (catalog or provider code)
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

fn default_http_timeout() -> u64 {
    30
}

fn default_download_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("torigen/{}", env!("CARGO_PKG_VERSION"))
}

/// Provider loading limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Upper bound for evaluating one provider module
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,

    /// Upper bound for a single provider operation call
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,

    /// Memory cap for one provider instance
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: u64,

    /// Local extensions evaluated concurrently during discovery
    #[serde(default = "default_max_concurrent_loads")]
    pub max_concurrent_loads: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            load_timeout_secs: default_load_timeout(),
            execution_timeout_secs: default_execution_timeout(),
            max_memory_mb: default_max_memory_mb(),
            max_concurrent_loads: default_max_concurrent_loads(),
        }
    }
}

impl LoaderConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }
}

fn default_load_timeout() -> u64 {
    10
}

fn default_execution_timeout() -> u64 {
    30
}

fn default_max_memory_mb() -> u64 {
    64
}

fn default_max_concurrent_loads() -> usize {
    4
}
