//! Mock implementations for testing
//!
//! Artifacts in these tests are JSON documents instead of WASM modules. The
//! [`MockEvaluator`] reads that document and serves the declared `describe`
//! record and operation responses, so discovery and lifecycle code run
//! unchanged without a WASM runtime or a network.

#![allow(dead_code)]

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use torigen_extensions::{
    FetchError, Fetcher, LoadError, ModuleEvaluator, ModuleExports, OperationInvoker,
};

/// What a mock artifact declares
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockArtifact {
    #[serde(default)]
    pub describe: Option<Value>,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub responses: Map<String, Value>,
    /// Evaluation fails with this message
    #[serde(default)]
    pub fail: Option<String>,
    /// Evaluation never finishes
    #[serde(default)]
    pub stall: bool,
}

/// Evaluates JSON mock artifacts
#[derive(Default)]
pub struct MockEvaluator {
    evaluations: Arc<Mutex<usize>>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluation_count(&self) -> usize {
        *self.evaluations.lock().unwrap()
    }
}

#[async_trait]
impl ModuleEvaluator for MockEvaluator {
    async fn evaluate(&self, code: Vec<u8>) -> Result<ModuleExports, LoadError> {
        *self.evaluations.lock().unwrap() += 1;

        let artifact: MockArtifact = serde_json::from_slice(&code)
            .map_err(|e| LoadError::Evaluate(format!("not a module: {}", e)))?;

        if artifact.stall {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(message) = artifact.fail {
            return Err(LoadError::Evaluate(message));
        }

        Ok(ModuleExports {
            default_export: artifact.describe,
            operations: artifact.operations.iter().cloned().collect::<BTreeSet<_>>(),
            invoker: Arc::new(MockInvoker {
                responses: artifact.responses,
            }),
        })
    }
}

/// Serves canned operation responses
pub struct MockInvoker {
    responses: Map<String, Value>,
}

#[async_trait]
impl OperationInvoker for MockInvoker {
    async fn invoke(&self, operation: &str, _args: Value) -> Result<Value, String> {
        self.responses
            .get(operation)
            .cloned()
            .ok_or_else(|| format!("{} is not implemented", operation))
    }
}

/// Mock fetch response
#[derive(Clone, Debug)]
pub enum MockResponse {
    Body(Vec<u8>),
    Status(u16),
    /// Never completes; exercises download timeouts
    Stall,
}

/// Mock fetcher for testing
///
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct MockFetcher {
    /// Pre-configured responses by URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Recorded fetches
    invocations: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mock_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn mock_body(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.mock_response(url, MockResponse::Body(body.into()));
    }

    pub fn mock_status(&self, url: &str, status: u16) {
        self.mock_response(url, MockResponse::Status(status));
    }

    pub fn clear(&self) {
        self.responses.lock().unwrap().clear();
    }

    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|fetched| fetched.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.invocations.lock().unwrap().push(url.to_string());

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(status)) => Err(FetchError::Status(status)),
            Some(MockResponse::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Request("stalled".to_string()))
            }
            None => Err(FetchError::Status(404)),
        }
    }
}
