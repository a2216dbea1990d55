//! Remote catalog integration tests
//!
//! Tests catalog fetching including:
//! - Network fetch and cache write
//! - Fallback to the cached document, then to an empty catalog
//! - In-memory reuse within the TTL

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use torigen_extensions::{CatalogOrigin, RemoteCatalog};

struct CatalogEnv {
    temp: TempDir,
    fetcher: Arc<MockFetcher>,
    catalog: RemoteCatalog,
}

impl CatalogEnv {
    fn new(ttl: Duration) -> Self {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let catalog = RemoteCatalog::new(
            CATALOG_URL,
            temp.path().join("remote-extensions/sources-list.json"),
            fetcher.clone(),
            Duration::from_millis(200),
            ttl,
        );
        Self {
            temp,
            fetcher,
            catalog,
        }
    }

    fn cache_path(&self) -> std::path::PathBuf {
        self.temp.path().join("remote-extensions/sources-list.json")
    }

    fn serve(&self, ids: &[&str]) {
        let sources: Vec<_> = ids
            .iter()
            .map(|id| RemoteSourceBuilder::new(id).build())
            .collect();
        self.fetcher.mock_body(CATALOG_URL, catalog_document(&sources));
    }
}

#[cfg(test)]
mod fetch {
    use super::*;

    #[tokio::test]
    async fn test_network_fetch_writes_cache() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha", "beta"]);

        let fetched = env.catalog.fetch().await;

        assert_eq!(fetched.origin, CatalogOrigin::Network);
        assert_eq!(fetched.list.sources.len(), 2);
        assert!(fetched.origin.error().is_none());
        assert!(env.cache_path().is_file());
    }

    #[tokio::test]
    async fn test_network_failure_serves_cache() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha"]);
        env.catalog.fetch().await;

        env.fetcher.mock_status(CATALOG_URL, 503);
        let fetched = env.catalog.refresh().await;

        assert!(matches!(fetched.origin, CatalogOrigin::Cache { .. }));
        assert!(fetched.origin.error().unwrap().contains("503"));
        assert_eq!(fetched.list.sources[0].id, "alpha");
    }

    #[tokio::test]
    async fn test_no_network_and_no_cache_is_empty() {
        let env = CatalogEnv::new(Duration::from_secs(60));

        let fetched = env.catalog.fetch().await;

        assert!(matches!(fetched.origin, CatalogOrigin::Empty { .. }));
        assert!(fetched.list.sources.is_empty());
        assert!(fetched.origin.error().is_some());
    }

    #[tokio::test]
    async fn test_invalid_document_falls_back() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.fetcher.mock_body(CATALOG_URL, b"<html>maintenance</html>".to_vec());

        let fetched = env.catalog.fetch().await;

        assert!(matches!(fetched.origin, CatalogOrigin::Empty { .. }));
        assert!(fetched
            .origin
            .error()
            .unwrap()
            .contains("invalid catalog document"));
        assert!(!env.cache_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_empty() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        std::fs::create_dir_all(env.cache_path().parent().unwrap()).unwrap();
        std::fs::write(env.cache_path(), "not json").unwrap();

        let fetched = env.catalog.fetch().await;

        assert!(matches!(fetched.origin, CatalogOrigin::Empty { .. }));
    }

    #[tokio::test]
    async fn test_stalled_network_times_out_to_cache() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha"]);
        env.catalog.fetch().await;

        env.fetcher.mock_response(CATALOG_URL, MockResponse::Stall);
        let fetched = env.catalog.refresh().await;

        assert!(matches!(fetched.origin, CatalogOrigin::Cache { .. }));
        assert_eq!(fetched.list.sources.len(), 1);
    }

    fn cache_tmp_path(env: &CatalogEnv) -> std::path::PathBuf {
        env.temp.path().join("remote-extensions/sources-list.json.tmp")
    }

    #[tokio::test]
    async fn test_failed_cache_write_keeps_previous_document() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha"]);
        env.catalog.fetch().await;

        std::fs::create_dir_all(cache_tmp_path(&env)).unwrap();
        env.serve(&["alpha", "beta"]);
        let fetched = env.catalog.refresh().await;
        assert_eq!(fetched.origin, CatalogOrigin::Network);
        assert_eq!(fetched.list.sources.len(), 2);

        std::fs::remove_dir(cache_tmp_path(&env)).unwrap();
        env.fetcher.mock_status(CATALOG_URL, 503);
        let fallback = env.catalog.refresh().await;
        assert!(matches!(fallback.origin, CatalogOrigin::Cache { .. }));
        assert_eq!(fallback.list.sources.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_leave_a_readable_cache() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha", "beta", "gamma"]);

        let (first, second) = tokio::join!(env.catalog.fetch(), env.catalog.fetch());
        assert_eq!(first.origin, CatalogOrigin::Network);
        assert_eq!(second.origin, CatalogOrigin::Network);
        assert!(!cache_tmp_path(&env).exists());

        env.fetcher.mock_status(CATALOG_URL, 503);
        let fallback = env.catalog.refresh().await;
        assert!(matches!(fallback.origin, CatalogOrigin::Cache { .. }));
        assert_eq!(fallback.list.sources.len(), 3);
    }
}

#[cfg(test)]
mod memory {
    use super::*;

    #[tokio::test]
    async fn test_available_sources_reuses_fresh_copy() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha"]);

        env.catalog.available_sources().await;
        env.catalog.available_sources().await;
        assert!(env.catalog.find("alpha").await.is_some());

        assert_eq!(env.fetcher.fetch_count(CATALOG_URL), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let env = CatalogEnv::new(Duration::ZERO);
        env.serve(&["alpha"]);

        env.catalog.available_sources().await;
        env.catalog.available_sources().await;

        assert_eq!(env.fetcher.fetch_count(CATALOG_URL), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha"]);
        env.catalog.available_sources().await;

        env.serve(&["alpha", "beta"]);
        env.catalog.invalidate();

        assert_eq!(env.catalog.available_sources().await.len(), 2);
        assert_eq!(env.fetcher.fetch_count(CATALOG_URL), 2);
    }

    #[tokio::test]
    async fn test_fallback_results_are_not_kept() {
        let env = CatalogEnv::new(Duration::from_secs(60));

        assert!(env.catalog.available_sources().await.is_empty());

        env.serve(&["alpha"]);
        assert_eq!(env.catalog.available_sources().await.len(), 1);
        assert_eq!(env.fetcher.fetch_count(CATALOG_URL), 2);
    }

    #[tokio::test]
    async fn test_find_unknown_id() {
        let env = CatalogEnv::new(Duration::from_secs(60));
        env.serve(&["alpha"]);

        assert!(env.catalog.find("omega").await.is_none());
    }
}
