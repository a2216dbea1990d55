//! Type definitions shared across Torigen crates

mod catalog_types;
mod extension_types;
mod provider_types;

pub use catalog_types::*;
pub use extension_types::*;
pub use provider_types::*;
