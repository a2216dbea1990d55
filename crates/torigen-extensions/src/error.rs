//! Error types for extension loading and lifecycle operations

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, ExtensionError>;

/// Errors surfaced by explicit, single-target operations
#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("Failed to load extension '{id}': {source}")]
    Load {
        id: String,
        #[source]
        source: LoadError,
    },

    #[error("Failed to download {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    /// The user's intent was not durably recorded
    #[error("Failed to write extension manifest: {0}")]
    ManifestWrite(String),

    #[error("Extension '{0}' is not installed")]
    NotInstalled(String),

    #[error("Extension '{0}' is not a remote extension")]
    NotRemote(String),

    #[error("Extension '{0}' is not in the remote source catalog")]
    NotInCatalog(String),

    #[error("Extension '{id}' requires app version {required} (running {current})")]
    Incompatible {
        id: String,
        required: String,
        current: String,
    },

    #[error(transparent)]
    InvalidId(#[from] torigen_core::Error),

    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extension '{id}' does not support {operation}")]
    UnsupportedOperation { id: String, operation: String },

    #[error("Provider '{id}' failed in {operation}: {message}")]
    Provider {
        id: String,
        operation: String,
        message: String,
    },

    /// The manifest task is gone (runtime shutting down)
    #[error("Manifest store is unavailable")]
    ManifestUnavailable,
}

impl ExtensionError {
    pub fn load(id: impl Into<String>, source: LoadError) -> Self {
        Self::Load {
            id: id.into(),
            source,
        }
    }

    pub fn fetch(url: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    pub fn provider(
        id: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            id: id.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Why a single extension could not be loaded
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("missing entry artifact {}", .0.display())]
    MissingEntry(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("evaluation failed: {0}")]
    Evaluate(String),

    #[error("not a valid source provider: {0}")]
    Invalid(#[from] ValidationError),

    #[error("load timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("provider declares id '{actual}' but '{expected}' was expected")]
    IdMismatch { expected: String, actual: String },
}

/// First structural violation found in a provider module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("module has no default export")]
    MissingDefaultExport,

    #[error("default export is not an object")]
    NotAnObject,

    #[error("missing or non-object field '{0}'")]
    MissingObject(&'static str),

    #[error("missing or non-string field 'info.{0}'")]
    MissingString(&'static str),

    #[error("missing required operation '{0}'")]
    MissingOperation(&'static str),

    #[error("malformed {field}: {message}")]
    Malformed {
        field: &'static str,
        message: String,
    },
}

/// Network failure while downloading a catalog or provider artifact
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Request(err.to_string()),
        }
    }
}
