//! Manifest reconciliation
//!
//! Merges a freshly discovered extension set into the persisted manifest:
//! - entries still discovered keep their persisted `enabled` flag, every
//!   other field is refreshed from the discovered metadata
//! - newly discovered extensions are appended with `enabled = true`
//! - entries that were not discovered are dropped

use std::collections::{HashMap, HashSet};
use torigen_core::types::{ExtensionInfo, ExtensionManifest};

/// Reconcile `manifest` against `discovered`
///
/// Existing entries keep their manifest position; new ones follow in
/// discovery order. Duplicate ids in `discovered` keep the first occurrence.
pub fn reconcile(manifest: &ExtensionManifest, discovered: &[ExtensionInfo]) -> ExtensionManifest {
    let mut fresh: HashMap<&str, &ExtensionInfo> = HashMap::with_capacity(discovered.len());
    let mut order = Vec::with_capacity(discovered.len());
    for info in discovered {
        if !fresh.contains_key(info.id.as_str()) {
            fresh.insert(info.id.as_str(), info);
            order.push(info.id.as_str());
        }
    }

    let mut placed: HashSet<&str> = HashSet::with_capacity(fresh.len());
    let mut extensions = Vec::with_capacity(fresh.len());

    for existing in &manifest.extensions {
        let Some(info) = fresh.get(existing.id.as_str()) else {
            continue;
        };
        if !placed.insert(existing.id.as_str()) {
            continue;
        }
        let mut merged = (*info).clone();
        merged.enabled = existing.enabled;
        extensions.push(merged);
    }

    for id in order {
        if placed.contains(id) {
            continue;
        }
        if let Some(info) = fresh.get(id) {
            let mut added = (*info).clone();
            added.enabled = true;
            extensions.push(added);
        }
    }

    ExtensionManifest { extensions }
}
