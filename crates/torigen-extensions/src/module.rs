//! Evaluation boundary for foreign provider code
//!
//! The core never evaluates code itself. A [`ModuleEvaluator`] turns raw
//! artifact bytes into [`ModuleExports`]: the module's default export (the
//! JSON returned by its `describe` export) plus the names of the operations
//! it exports and a handle to invoke them.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::LoadError;

/// Export that yields the provider's `{ info, capabilities }` record
pub const DESCRIBE_EXPORT: &str = "describe";

pub const GET_HOMEPAGE: &str = "get_homepage";
pub const GET_MANGA_DETAILS: &str = "get_manga_details";
pub const GET_CHAPTERS: &str = "get_chapters";
pub const GET_CHAPTER_DETAILS: &str = "get_chapter_details";
pub const GET_SEARCH_RESULTS: &str = "get_search_results";
pub const GET_SEARCH_TAGS: &str = "get_search_tags";

/// Operations a module must export to be admitted
pub const REQUIRED_OPERATIONS: [&str; 3] = [GET_HOMEPAGE, GET_MANGA_DETAILS, GET_CHAPTERS];

/// Every operation of the provider contract
pub const PROVIDER_OPERATIONS: [&str; 6] = [
    GET_HOMEPAGE,
    GET_MANGA_DETAILS,
    GET_CHAPTERS,
    GET_CHAPTER_DETAILS,
    GET_SEARCH_RESULTS,
    GET_SEARCH_TAGS,
];

/// Calls an exported operation with a JSON argument object
#[async_trait]
pub trait OperationInvoker: Send + Sync {
    async fn invoke(&self, operation: &str, args: Value) -> Result<Value, String>;
}

/// Turns artifact bytes into an evaluated module
#[async_trait]
pub trait ModuleEvaluator: Send + Sync {
    async fn evaluate(&self, code: Vec<u8>) -> Result<ModuleExports, LoadError>;
}

/// What an evaluated module exposes
#[derive(Clone)]
pub struct ModuleExports {
    /// `None` when the module has no `describe` export
    pub default_export: Option<Value>,
    /// Contract operations the module exports
    pub operations: BTreeSet<String>,
    pub invoker: Arc<dyn OperationInvoker>,
}

impl ModuleExports {
    pub fn exports(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }
}

impl fmt::Debug for ModuleExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleExports")
            .field("default_export", &self.default_export)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}
