//! Version information for the torigen CLI

use serde::{Deserialize, Serialize};

/// Runtime that evaluates foreign provider modules
pub const PROVIDER_RUNTIME: &str = "extism";

/// Version information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Semantic version; compared against catalog `minAppVersion`
    pub version: String,

    /// Provider module runtime
    pub provider_runtime: String,

    /// `<os>-<arch>` of this build
    pub platform: String,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            provider_runtime: PROVIDER_RUNTIME.to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    pub fn display(&self) -> String {
        format!("torigen {} ({})", self.version, self.platform)
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
