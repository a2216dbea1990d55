//! Remote source catalog types
//!
//! The catalog endpoint returns:
//! ```json
//! { "sources": [ ... ], "version": "1.4.0", "lastUpdated": "2026-02-01T00:00:00Z" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An installable remote provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSourceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub base_url: String,
    pub source_url: String,
    /// Direct artifact location when it differs from `source_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_app_version: Option<String>,
}

impl RemoteSourceInfo {
    /// URL the provider code is downloaded from
    pub fn code_url(&self) -> &str {
        self.download_url.as_deref().unwrap_or(&self.source_url)
    }
}

/// The whole catalog document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSourcesList {
    #[serde(default)]
    pub sources: Vec<RemoteSourceInfo>,
    pub version: String,
    pub last_updated: String,
}

impl RemoteSourcesList {
    /// Placeholder used when neither the network nor the cache is usable
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            sources: Vec::new(),
            version: "0.0.0".to_string(),
            last_updated: now.to_rfc3339(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&RemoteSourceInfo> {
        self.sources.iter().find(|source| source.id == id)
    }
}
