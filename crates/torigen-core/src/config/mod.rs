//! Runtime configuration
//!
//! Precedence (low to high):
//! 1. Built-in defaults
//! 2. `config.yaml` in the config directory
//! 3. Environment variables (TORIGEN_* prefix)
//! 4. CLI flags (handled by caller)

mod loader;
mod runtime;

pub use loader::ConfigLoader;
pub use runtime::{CatalogConfig, LoaderConfig, NetworkConfig, RuntimeConfig, DEFAULT_CATALOG_URL};
