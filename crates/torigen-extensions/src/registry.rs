//! In-memory registry of loaded extensions
//!
//! Rebuilt by every discovery pass; provider instances never outlive the
//! process.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::provider::LoadedExtension;

/// Map from extension id to its loaded provider, listed in id order
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<BTreeMap<String, LoadedExtension>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<LoadedExtension> {
        self.entries.read().get(id).cloned()
    }

    pub fn get_all(&self) -> Vec<LoadedExtension> {
        self.entries.read().values().cloned().collect()
    }

    pub fn get_all_enabled(&self) -> Vec<LoadedExtension> {
        self.entries
            .read()
            .values()
            .filter(|ext| ext.info.enabled)
            .cloned()
            .collect()
    }

    /// Insert under the extension's own id, returning what it replaced
    pub fn put(&self, loaded: LoadedExtension) -> Option<LoadedExtension> {
        self.entries.write().insert(loaded.info.id.clone(), loaded)
    }

    pub fn remove(&self, id: &str) -> Option<LoadedExtension> {
        self.entries.write().remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Update the enabled flag in place. Returns false if `id` is not loaded.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        match self.entries.write().get_mut(id) {
            Some(ext) => {
                ext.info.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Swap in a complete new set
    pub fn replace_all(&self, loaded: Vec<LoadedExtension>) {
        let entries = loaded
            .into_iter()
            .map(|ext| (ext.info.id.clone(), ext))
            .collect();
        *self.entries.write() = entries;
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
