//! Extension registry and lifecycle management for Torigen
//!
//! This crate handles:
//! - Discovery of local and remote source providers
//! - Provider validation and loading (WASM modules via Extism)
//! - The persisted extension manifest
//! - Remote catalog fetching and caching
//! - Install, update, uninstall and enable/disable
//! - Local extension scaffolding

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod loader;
pub mod locks;
pub mod manifest;
pub mod module;
pub mod paths;
pub mod provider;
pub mod query;
pub mod reconcile;
pub mod registry;
pub mod template;
pub mod validator;
pub mod wasm;

pub use catalog::{CatalogFetch, CatalogOrigin, RemoteCatalog};
pub use error::{ExtensionError, FetchError, LoadError, Result, ValidationError};
pub use fetch::{Fetcher, HttpFetcher};
pub use lifecycle::{
    AvailableUpdate, DiscoveryFailure, DiscoveryReport, ExtensionManager, UninstallOutcome,
};
pub use loader::ProviderLoader;
pub use manifest::ManifestStore;
pub use module::{ModuleEvaluator, ModuleExports, OperationInvoker};
pub use paths::ExtensionPaths;
pub use provider::{ForeignProvider, LoadedExtension, SourceProvider};
pub use query::{SortKey, SortOrder};
pub use registry::Registry;
pub use validator::{is_valid_source_provider, validate, ProviderShape};
pub use wasm::WasmEvaluator;
