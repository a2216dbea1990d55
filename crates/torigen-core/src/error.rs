//! Error types for torigen-core

use thiserror::Error;

/// Result type alias using torigen-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Torigen
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Extension id that cannot be used as a storage key
    #[error("Invalid extension id '{id}': {reason}")]
    InvalidExtensionId { id: String, reason: String },

    /// No usable application directory on this platform
    #[error("Could not determine the {kind} directory")]
    DirectoryUnavailable { kind: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid extension id error
    pub fn invalid_extension_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExtensionId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a directory unavailable error
    pub fn directory_unavailable(kind: impl Into<String>) -> Self {
        Self::DirectoryUnavailable { kind: kind.into() }
    }
}
