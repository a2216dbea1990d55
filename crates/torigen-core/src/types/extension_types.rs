//! Extension metadata and the persisted manifest
//!
//! The manifest is stored as a single JSON document:
//! ```json
//! {
//!   "extensions": [
//!     {
//!       "id": "mangadex",
//!       "name": "MangaDex",
//!       "iconUrl": "https://mangadex.org/favicon.ico",
//!       "baseUrl": "https://mangadex.org",
//!       "version": "1.0.0",
//!       "enabled": true,
//!       "origin": "remote",
//!       "sourceUrl": "https://example.com/mangadex.wasm",
//!       "lastUpdated": "2026-01-21T10:00:00Z"
//!     }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RemoteSourceInfo, SourceInfo};

/// Where an extension's code comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionOrigin {
    /// Directory under the local `extensions/` root
    #[default]
    Local,
    /// Downloaded from a remote catalog and cached under `remote-extensions/`
    Remote,
}

impl fmt::Display for ExtensionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionOrigin::Local => write!(f, "local"),
            ExtensionOrigin::Remote => write!(f, "remote"),
        }
    }
}

/// Persisted, user-visible metadata for one extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    /// Stable identifier, unique across the manifest
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub icon_url: String,

    #[serde(default)]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// User-controlled switch; the manifest is its only durable record
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, alias = "source")]
    pub origin: ExtensionOrigin,

    /// Download location (remote only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Install or update time (remote only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

impl ExtensionInfo {
    /// Metadata for a freshly discovered local extension
    pub fn local(info: &SourceInfo) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            icon_url: info.icon_url.clone(),
            base_url: info.base_url.clone(),
            version: None,
            author: None,
            description: None,
            enabled: true,
            origin: ExtensionOrigin::Local,
            source_url: None,
            last_updated: None,
        }
    }

    /// Metadata for a remote extension installed from a catalog entry
    pub fn remote(source: &RemoteSourceInfo, installed_at: DateTime<Utc>) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            icon_url: source.icon_url.clone(),
            base_url: source.base_url.clone(),
            version: Some(source.version.clone()),
            author: Some(source.author.clone()),
            description: Some(source.description.clone()),
            enabled: true,
            origin: ExtensionOrigin::Remote,
            source_url: Some(source.code_url().to_string()),
            last_updated: Some(installed_at),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.origin == ExtensionOrigin::Remote
    }
}

/// The durable `{ extensions: [...] }` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    #[serde(default)]
    pub extensions: Vec<ExtensionInfo>,
}

impl ExtensionManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an entry by id
    pub fn get(&self, id: &str) -> Option<&ExtensionInfo> {
        self.extensions.iter().find(|ext| ext.id == id)
    }

    /// Check if an entry exists
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Replace the entry with the same id in place, or append it
    pub fn upsert(&mut self, info: ExtensionInfo) {
        match self.extensions.iter_mut().find(|ext| ext.id == info.id) {
            Some(existing) => *existing = info,
            None => self.extensions.push(info),
        }
    }

    /// Remove an entry, returning it if it was present
    pub fn remove(&mut self, id: &str) -> Option<ExtensionInfo> {
        let index = self.extensions.iter().position(|ext| ext.id == id)?;
        Some(self.extensions.remove(index))
    }

    /// Set the enabled flag of one entry. Returns false if the id is unknown.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.extensions.iter_mut().find(|ext| ext.id == id) {
            Some(ext) => {
                ext.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Entries recorded as remote installs
    pub fn remote_entries(&self) -> impl Iterator<Item = &ExtensionInfo> {
        self.extensions.iter().filter(|ext| ext.is_remote())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
