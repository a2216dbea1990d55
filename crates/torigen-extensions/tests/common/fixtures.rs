//! Temporary data roots with a manager wired to the mocks

#![allow(dead_code)]

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use torigen_core::types::RemoteSourceInfo;
use torigen_core::RuntimeConfig;
use torigen_extensions::{ExtensionManager, ExtensionPaths};

use super::builders::catalog_document;
use super::mocks::{MockEvaluator, MockFetcher};

pub const CATALOG_URL: &str = "https://catalog.example/sources.json";
pub const APP_VERSION: &str = "1.0.0";

/// Runtime configuration with short timeouts
pub fn test_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.app_version = APP_VERSION.to_string();
    config.catalog.url = CATALOG_URL.to_string();
    config.network.download_timeout_secs = 1;
    config.loader.load_timeout_secs = 1;
    config.loader.execution_timeout_secs = 1;
    config.loader.max_concurrent_loads = 2;
    config
}

/// A data root, the mocks and a manager over them
///
/// Must be created inside a tokio runtime.
pub struct TestEnv {
    pub temp: TempDir,
    pub config: RuntimeConfig,
    pub evaluator: Arc<MockEvaluator>,
    pub fetcher: Arc<MockFetcher>,
    pub manager: ExtensionManager,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let temp = TempDir::new().unwrap();
        let evaluator = Arc::new(MockEvaluator::new());
        let fetcher = Arc::new(MockFetcher::new());
        let manager = ExtensionManager::new(
            temp.path(),
            &config,
            evaluator.clone(),
            fetcher.clone(),
        );

        Self {
            temp,
            config,
            evaluator,
            fetcher,
            manager,
        }
    }

    /// A second manager over the same root, as after an application restart
    pub fn restart(&self) -> ExtensionManager {
        ExtensionManager::new(
            self.temp.path(),
            &self.config,
            self.evaluator.clone(),
            self.fetcher.clone(),
        )
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn paths(&self) -> ExtensionPaths {
        ExtensionPaths::new(self.temp.path())
    }

    /// Write `extensions/<dir>/index.wasm`
    pub fn write_local(&self, dir: &str, artifact: Vec<u8>) -> PathBuf {
        let dir = self.paths().extensions_dir().join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.wasm"), artifact).unwrap();
        dir
    }

    /// Write `remote-extensions/<id>.wasm` directly
    pub fn write_remote_artifact(&self, id: &str, artifact: Vec<u8>) -> PathBuf {
        let path = self.paths().remote_artifact(id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, artifact).unwrap();
        path
    }

    pub fn write_manifest(&self, manifest: Value) {
        let path = self.paths().manifest_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec_pretty(&manifest).unwrap()).unwrap();
    }

    pub fn read_manifest(&self) -> Value {
        let content = std::fs::read(self.paths().manifest_path()).unwrap();
        serde_json::from_slice(&content).unwrap()
    }

    pub fn manifest_entry(&self, id: &str) -> Option<Value> {
        self.read_manifest()["extensions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|entry| entry["id"] == id)
            .cloned()
    }

    pub fn manifest_ids(&self) -> Vec<String> {
        self.read_manifest()["extensions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["id"].as_str().unwrap().to_string())
            .collect()
    }

    /// Serve `sources` as the catalog, each with its artifact at its code URL
    pub fn publish(&self, sources: &[(RemoteSourceInfo, Vec<u8>)]) {
        let entries: Vec<RemoteSourceInfo> =
            sources.iter().map(|(source, _)| source.clone()).collect();
        self.fetcher.mock_body(CATALOG_URL, catalog_document(&entries));
        for (source, artifact) in sources {
            self.fetcher.mock_body(source.code_url(), artifact.clone());
        }
        self.manager.catalog().invalidate();
    }
}
