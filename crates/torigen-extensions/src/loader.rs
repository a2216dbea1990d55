//! Provider loading
//!
//! Turns a location into a validated provider: read the entry artifact,
//! evaluate it through the injected [`ModuleEvaluator`], then pass the result
//! through the validator. Every failure is a [`LoadError`] so the caller can
//! skip the extension and keep going.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use torigen_core::config::LoaderConfig;
use torigen_core::types::ExtensionInfo;
use tracing::debug;

use crate::error::LoadError;
use crate::module::ModuleEvaluator;
use crate::provider::{ForeignProvider, LoadedExtension};
use crate::validator;

/// File name of a local extension's entry artifact
pub const ENTRY_ARTIFACT: &str = "index.wasm";

/// Loads provider artifacts with a bounded evaluation time
#[derive(Clone)]
pub struct ProviderLoader {
    evaluator: Arc<dyn ModuleEvaluator>,
    load_timeout: Duration,
    call_timeout: Duration,
}

impl ProviderLoader {
    pub fn new(evaluator: Arc<dyn ModuleEvaluator>, config: &LoaderConfig) -> Self {
        Self {
            evaluator,
            load_timeout: config.load_timeout(),
            call_timeout: config.execution_timeout(),
        }
    }

    /// Load a local extension directory (`<dir>/index.wasm`)
    pub async fn load_local(&self, dir: &Path) -> Result<LoadedExtension, LoadError> {
        let entry = dir.join(ENTRY_ARTIFACT);
        let provider = self.load_file(&entry).await?;

        Ok(LoadedExtension {
            info: ExtensionInfo::local(&provider.shape().info),
            source: Arc::new(provider),
            directory_path: Some(dir.to_path_buf()),
        })
    }

    /// Load a single artifact file
    pub async fn load_file(&self, path: &Path) -> Result<ForeignProvider, LoadError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(LoadError::MissingEntry(path.to_path_buf()));
        }

        let code = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Evaluating {} ({} bytes)", path.display(), code.len());
        self.load_bytes(code).await
    }

    /// Evaluate and validate artifact bytes
    pub async fn load_bytes(&self, code: Vec<u8>) -> Result<ForeignProvider, LoadError> {
        let exports = tokio::time::timeout(self.load_timeout, self.evaluator.evaluate(code))
            .await
            .map_err(|_| LoadError::Timeout(self.load_timeout))??;

        let shape = validator::validate(&exports)?;
        Ok(ForeignProvider::new(shape, exports, self.call_timeout))
    }
}

impl std::fmt::Debug for ProviderLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderLoader")
            .field("load_timeout", &self.load_timeout)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
