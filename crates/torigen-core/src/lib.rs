//! # torigen-core
//!
//! Core library for Torigen providing:
//! - Extension metadata and manifest types shared by every crate
//! - Provider-side domain types (manga, chapters, search)
//! - Remote source catalog types
//! - Hierarchical runtime configuration
//! - Extension id validation and directory helpers

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::{ConfigLoader, RuntimeConfig};
pub use error::{Error, Result};
pub use utils::{get_config_dir, get_data_dir, validate_extension_id};
