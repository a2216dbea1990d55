//! WebAssembly module evaluation via Extism
//!
//! Provider artifacts are Extism plugins. WASI is disabled, so a provider has
//! no filesystem or network access of its own; every call is bounded by the
//! configured execution timeout and memory cap.

use async_trait::async_trait;
use extism::{Manifest, Plugin, PluginBuilder, Wasm};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use torigen_core::config::LoaderConfig;
use tracing::debug;

use crate::error::LoadError;
use crate::module::{
    ModuleEvaluator, ModuleExports, OperationInvoker, DESCRIBE_EXPORT, PROVIDER_OPERATIONS,
};

/// WASM pages are 64KB each
const WASM_PAGE_SIZE: u64 = 64 * 1024;

/// Evaluates provider artifacts as Extism plugins
#[derive(Debug, Clone)]
pub struct WasmEvaluator {
    execution_timeout: Duration,
    max_memory_bytes: u64,
}

impl WasmEvaluator {
    pub fn new(execution_timeout: Duration, max_memory_bytes: u64) -> Self {
        Self {
            execution_timeout,
            max_memory_bytes,
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(
            config.execution_timeout(),
            config.max_memory_mb * 1024 * 1024,
        )
    }

    fn build_plugin(&self, code: Vec<u8>) -> Result<Plugin, LoadError> {
        let pages = self.max_memory_bytes / WASM_PAGE_SIZE;
        let max_pages = u32::try_from(pages).unwrap_or(u32::MAX);

        let manifest = Manifest::new([Wasm::data(code)])
            .with_timeout(self.execution_timeout)
            .with_memory_max(max_pages);

        PluginBuilder::new(manifest)
            .with_wasi(false)
            .build()
            .map_err(|e| LoadError::Evaluate(format!("failed to instantiate module: {e}")))
    }
}

#[async_trait]
impl ModuleEvaluator for WasmEvaluator {
    async fn evaluate(&self, code: Vec<u8>) -> Result<ModuleExports, LoadError> {
        let evaluator = self.clone();

        tokio::task::spawn_blocking(move || {
            let mut plugin = evaluator.build_plugin(code)?;

            let default_export = if plugin.function_exists(DESCRIBE_EXPORT) {
                let raw = plugin
                    .call::<&str, String>(DESCRIBE_EXPORT, "")
                    .map_err(|e| LoadError::Evaluate(format!("describe call failed: {e}")))?;
                let value: Value = serde_json::from_str(&raw).map_err(|e| {
                    LoadError::Evaluate(format!("describe returned invalid JSON: {e}"))
                })?;
                Some(value)
            } else {
                None
            };

            let operations: BTreeSet<String> = PROVIDER_OPERATIONS
                .iter()
                .filter(|op| plugin.function_exists(op))
                .map(|op| op.to_string())
                .collect();

            debug!("Evaluated module exporting {:?}", operations);

            Ok(ModuleExports {
                default_export,
                operations,
                invoker: Arc::new(WasmInvoker {
                    plugin: Arc::new(Mutex::new(plugin)),
                }),
            })
        })
        .await
        .map_err(|e| LoadError::Evaluate(format!("evaluation task failed: {e}")))?
    }
}

/// Invokes exports on one plugin instance; calls are serialized by the mutex
struct WasmInvoker {
    plugin: Arc<Mutex<Plugin>>,
}

#[async_trait]
impl OperationInvoker for WasmInvoker {
    async fn invoke(&self, operation: &str, args: Value) -> Result<Value, String> {
        let input =
            serde_json::to_string(&args).map_err(|e| format!("failed to serialize args: {e}"))?;
        let plugin = Arc::clone(&self.plugin);
        let name = operation.to_string();

        let output = tokio::task::spawn_blocking(move || {
            plugin
                .lock()
                .call::<&str, String>(&name, &input)
                .map_err(|e| format!("{name} call failed: {e}"))
        })
        .await
        .map_err(|e| format!("call task failed: {e}"))??;

        serde_json::from_str(&output).map_err(|e| format!("invalid JSON response: {e}"))
    }
}
