//! CLI command implementations

pub mod extension;
pub mod version;
