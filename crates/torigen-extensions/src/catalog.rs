//! Remote source catalog
//!
//! Fetches the list of installable remote extensions. A successful fetch is
//! cached to `remote-extensions/sources-list.json`; when the network is
//! unavailable the cached copy is served, and when there is no usable cache
//! either an empty catalog is returned. The fetch error is always reported
//! alongside the degraded list.

use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use torigen_core::types::{RemoteSourceInfo, RemoteSourcesList};
use tracing::{debug, info, warn};

use crate::fetch::{fetch_with_timeout, Fetcher};

/// Where a catalog came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOrigin {
    Network,
    /// Network failed; served from the cached document
    Cache { error: String },
    /// Network and cache both failed
    Empty { error: String },
}

impl CatalogOrigin {
    pub fn error(&self) -> Option<&str> {
        match self {
            CatalogOrigin::Network => None,
            CatalogOrigin::Cache { error } | CatalogOrigin::Empty { error } => Some(error),
        }
    }
}

impl fmt::Display for CatalogOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogOrigin::Network => write!(f, "network"),
            CatalogOrigin::Cache { .. } => write!(f, "cache"),
            CatalogOrigin::Empty { .. } => write!(f, "empty"),
        }
    }
}

/// Result of a catalog fetch
#[derive(Debug, Clone)]
pub struct CatalogFetch {
    pub list: RemoteSourcesList,
    pub origin: CatalogOrigin,
}

/// Fetches and caches the remote source catalog
pub struct RemoteCatalog {
    url: String,
    cache_path: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    download_timeout: Duration,
    ttl: Duration,
    memory: Mutex<Option<(Instant, RemoteSourcesList)>>,
    cache_write: tokio::sync::Mutex<()>,
}

impl RemoteCatalog {
    pub fn new(
        url: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        fetcher: Arc<dyn Fetcher>,
        download_timeout: Duration,
        ttl: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            cache_path: cache_path.into(),
            fetcher,
            download_timeout,
            ttl,
            memory: Mutex::new(None),
            cache_write: tokio::sync::Mutex::new(()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch from the network, falling back to the cache, then to empty
    pub async fn fetch(&self) -> CatalogFetch {
        let error = match self.fetch_network().await {
            Ok(list) => {
                self.write_cache(&list).await;
                *self.memory.lock() = Some((Instant::now(), list.clone()));
                info!(
                    "Fetched remote catalog {} ({} sources)",
                    list.version,
                    list.sources.len()
                );
                return CatalogFetch {
                    list,
                    origin: CatalogOrigin::Network,
                };
            }
            Err(e) => e,
        };

        warn!("Failed to fetch remote catalog: {}. Trying cache...", error);

        match self.read_cache().await {
            Ok(list) => {
                warn!("Using cached remote catalog {}", list.version);
                CatalogFetch {
                    list,
                    origin: CatalogOrigin::Cache { error },
                }
            }
            Err(cache_error) => {
                warn!("Failed to load cached remote catalog: {}", cache_error);
                CatalogFetch {
                    list: RemoteSourcesList::empty(Utc::now()),
                    origin: CatalogOrigin::Empty { error },
                }
            }
        }
    }

    /// Always go to the network (with the usual fallbacks)
    pub async fn refresh(&self) -> CatalogFetch {
        self.fetch().await
    }

    /// Catalog entries, served from memory while younger than the TTL
    pub async fn available_sources(&self) -> Vec<RemoteSourceInfo> {
        if let Some(list) = self.fresh_memory() {
            debug!("Serving remote catalog from memory");
            return list.sources;
        }
        self.fetch().await.list.sources
    }

    /// Look up one catalog entry
    pub async fn find(&self, id: &str) -> Option<RemoteSourceInfo> {
        self.available_sources()
            .await
            .into_iter()
            .find(|source| source.id == id)
    }

    /// Drop the in-memory copy so the next lookup refetches
    pub fn invalidate(&self) {
        *self.memory.lock() = None;
    }

    fn fresh_memory(&self) -> Option<RemoteSourcesList> {
        let memory = self.memory.lock();
        match memory.as_ref() {
            Some((fetched_at, list)) if fetched_at.elapsed() < self.ttl => Some(list.clone()),
            _ => None,
        }
    }

    async fn fetch_network(&self) -> Result<RemoteSourcesList, String> {
        let body = fetch_with_timeout(self.fetcher.as_ref(), &self.url, self.download_timeout)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_slice(&body).map_err(|e| format!("invalid catalog document: {}", e))
    }

    async fn read_cache(&self) -> Result<RemoteSourcesList, String> {
        let content = tokio::fs::read(&self.cache_path)
            .await
            .map_err(|e| format!("{}: {}", self.cache_path.display(), e))?;
        serde_json::from_slice(&content).map_err(|e| e.to_string())
    }

    /// Replace the cached document atomically; concurrent writers queue
    async fn write_cache(&self, list: &RemoteSourcesList) {
        let _writing = self.cache_write.lock().await;
        let tmp = self.cache_tmp_path();

        let result = async {
            if let Some(parent) = self.cache_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_vec_pretty(list)?;
            tokio::fs::write(&tmp, content).await?;
            tokio::fs::rename(&tmp, &self.cache_path).await
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to cache remote catalog: {}", e);
            let _ = tokio::fs::remove_file(&tmp).await;
        }
    }

    fn cache_tmp_path(&self) -> PathBuf {
        let mut tmp = self.cache_path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl fmt::Debug for RemoteCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCatalog")
            .field("url", &self.url)
            .field("cache_path", &self.cache_path)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
