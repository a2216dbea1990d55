//! Manifest persistence
//!
//! A single background task owns `extensions/manifest.json`. Every read and
//! every read-modify-write is a command sent to that task, so two lifecycle
//! operations can never interleave their updates and lose one of them.
//!
//! Writes go to `manifest.json.tmp` first and are renamed into place.

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use torigen_core::types::{ExtensionInfo, ExtensionManifest};
use tracing::{debug, warn};

use crate::error::{ExtensionError, Result};
use crate::reconcile::reconcile;

const COMMAND_BUFFER: usize = 32;

type WriteResult<T> = std::result::Result<T, String>;

enum ManifestCommand {
    Ensure {
        reply: oneshot::Sender<WriteResult<()>>,
    },
    Load {
        reply: oneshot::Sender<ExtensionManifest>,
    },
    Save {
        manifest: ExtensionManifest,
        reply: oneshot::Sender<WriteResult<()>>,
    },
    Upsert {
        info: ExtensionInfo,
        keep_enabled: bool,
        reply: oneshot::Sender<WriteResult<ExtensionInfo>>,
    },
    Remove {
        id: String,
        reply: oneshot::Sender<WriteResult<Option<ExtensionInfo>>>,
    },
    SetEnabled {
        /// `None` targets every entry
        ids: Option<Vec<String>>,
        enabled: bool,
        reply: oneshot::Sender<WriteResult<Vec<String>>>,
    },
    Reconcile {
        discovered: Vec<ExtensionInfo>,
        reply: oneshot::Sender<WriteResult<ExtensionManifest>>,
    },
}

/// Handle to the manifest task; cheap to clone
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
    tx: mpsc::Sender<ManifestCommand>,
}

impl ManifestStore {
    /// Spawn the task owning `path`. Must be called inside a tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run(ManifestFile::new(path.clone()), rx));
        Self { path, tx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the manifest (empty) if it does not exist yet
    pub async fn ensure(&self) -> Result<()> {
        self.request(|reply| ManifestCommand::Ensure { reply })
            .await?
            .map_err(ExtensionError::ManifestWrite)
    }

    /// Read the manifest; unreadable documents come back empty
    pub async fn load(&self) -> Result<ExtensionManifest> {
        self.request(|reply| ManifestCommand::Load { reply }).await
    }

    /// Replace the whole document
    pub async fn save(&self, manifest: ExtensionManifest) -> Result<()> {
        self.request(|reply| ManifestCommand::Save { manifest, reply })
            .await?
            .map_err(ExtensionError::ManifestWrite)
    }

    /// Insert or replace an entry by id, keeping its position
    pub async fn upsert(&self, info: ExtensionInfo) -> Result<ExtensionInfo> {
        self.request(|reply| ManifestCommand::Upsert {
            info,
            keep_enabled: false,
            reply,
        })
        .await?
        .map_err(ExtensionError::ManifestWrite)
    }

    /// Like [`upsert`](Self::upsert), but an existing entry's `enabled` flag wins
    pub async fn upsert_keep_enabled(&self, info: ExtensionInfo) -> Result<ExtensionInfo> {
        self.request(|reply| ManifestCommand::Upsert {
            info,
            keep_enabled: true,
            reply,
        })
        .await?
        .map_err(ExtensionError::ManifestWrite)
    }

    /// Remove an entry, returning it if it existed
    pub async fn remove(&self, id: &str) -> Result<Option<ExtensionInfo>> {
        let id = id.to_string();
        self.request(|reply| ManifestCommand::Remove { id, reply })
            .await?
            .map_err(ExtensionError::ManifestWrite)
    }

    /// Set one entry's flag. Returns false if the id is unknown.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool> {
        let updated = self.set_enabled_many(&[id.to_string()], enabled).await?;
        Ok(!updated.is_empty())
    }

    /// Set the flag on several entries; returns the ids that exist
    pub async fn set_enabled_many(&self, ids: &[String], enabled: bool) -> Result<Vec<String>> {
        let ids = Some(ids.to_vec());
        self.request(|reply| ManifestCommand::SetEnabled {
            ids,
            enabled,
            reply,
        })
        .await?
        .map_err(ExtensionError::ManifestWrite)
    }

    /// Set the flag on every entry; returns the affected ids
    pub async fn set_all_enabled(&self, enabled: bool) -> Result<Vec<String>> {
        self.request(|reply| ManifestCommand::SetEnabled {
            ids: None,
            enabled,
            reply,
        })
        .await?
        .map_err(ExtensionError::ManifestWrite)
    }

    /// Reconcile against a discovered set and persist the result
    pub async fn reconcile(&self, discovered: Vec<ExtensionInfo>) -> Result<ExtensionManifest> {
        self.request(|reply| ManifestCommand::Reconcile { discovered, reply })
            .await?
            .map_err(ExtensionError::ManifestWrite)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ManifestCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| ExtensionError::ManifestUnavailable)?;
        response
            .await
            .map_err(|_| ExtensionError::ManifestUnavailable)
    }
}

async fn run(file: ManifestFile, mut rx: mpsc::Receiver<ManifestCommand>) {
    while let Some(command) = rx.recv().await {
        // A dropped receiver only means the caller stopped waiting
        match command {
            ManifestCommand::Ensure { reply } => {
                let _ = reply.send(file.ensure().await);
            }
            ManifestCommand::Load { reply } => {
                let _ = reply.send(file.load().await);
            }
            ManifestCommand::Save { manifest, reply } => {
                let _ = reply.send(file.write(&manifest).await);
            }
            ManifestCommand::Upsert {
                info,
                keep_enabled,
                reply,
            } => {
                let result = file
                    .modify(|manifest| {
                        let mut info = info;
                        if keep_enabled {
                            if let Some(existing) = manifest.get(&info.id) {
                                info.enabled = existing.enabled;
                            }
                        }
                        manifest.upsert(info.clone());
                        (true, info)
                    })
                    .await;
                let _ = reply.send(result);
            }
            ManifestCommand::Remove { id, reply } => {
                let result = file
                    .modify(|manifest| {
                        let removed = manifest.remove(&id);
                        (removed.is_some(), removed)
                    })
                    .await;
                let _ = reply.send(result);
            }
            ManifestCommand::SetEnabled {
                ids,
                enabled,
                reply,
            } => {
                let result = file
                    .modify(|manifest| {
                        let targets: Vec<String> = match ids {
                            Some(ids) => ids,
                            None => manifest.extensions.iter().map(|e| e.id.clone()).collect(),
                        };
                        let updated: Vec<String> = targets
                            .into_iter()
                            .filter(|id| manifest.set_enabled(id, enabled))
                            .collect();
                        (!updated.is_empty(), updated)
                    })
                    .await;
                let _ = reply.send(result);
            }
            ManifestCommand::Reconcile { discovered, reply } => {
                let result = file
                    .modify(|manifest| {
                        let reconciled = reconcile(manifest, &discovered);
                        *manifest = reconciled.clone();
                        (true, reconciled)
                    })
                    .await;
                let _ = reply.send(result);
            }
        }
    }
    debug!("Manifest task for {} stopped", file.path.display());
}

/// Direct file access, only ever used from the manifest task
struct ManifestFile {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl ManifestFile {
    fn new(path: PathBuf) -> Self {
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        Self {
            path,
            tmp_path: PathBuf::from(tmp),
        }
    }

    async fn ensure(&self) -> WriteResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }
        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        debug!("Creating empty manifest at {}", self.path.display());
        self.write(&ExtensionManifest::new()).await
    }

    async fn load(&self) -> ExtensionManifest {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {}", self.path.display(), e);
                }
                return ExtensionManifest::new();
            }
        };

        match parse_manifest(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(
                    "Failed to parse {}: {}. Treating it as empty",
                    self.path.display(),
                    e
                );
                ExtensionManifest::new()
            }
        }
    }

    async fn write(&self, manifest: &ExtensionManifest) -> WriteResult<()> {
        let content = serde_json::to_string_pretty(manifest)
            .map_err(|e| format!("failed to serialize manifest: {}", e))?;

        tokio::fs::write(&self.tmp_path, content)
            .await
            .map_err(|e| format!("failed to write {}: {}", self.tmp_path.display(), e))?;
        tokio::fs::rename(&self.tmp_path, &self.path)
            .await
            .map_err(|e| format!("failed to replace {}: {}", self.path.display(), e))
    }

    /// Load, apply `f`, and write back if `f` reports a change
    async fn modify<T>(
        &self,
        f: impl FnOnce(&mut ExtensionManifest) -> (bool, T),
    ) -> WriteResult<T> {
        let mut manifest = self.load().await;
        let (changed, value) = f(&mut manifest);
        if changed {
            self.write(&manifest).await?;
        }
        Ok(value)
    }
}

/// Parse a manifest document, skipping malformed entries and duplicate ids
fn parse_manifest(content: &str) -> std::result::Result<ExtensionManifest, String> {
    let document: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let entries = match document.get("extensions") {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err("'extensions' is not a list".to_string()),
        None => return Ok(ExtensionManifest::new()),
    };

    let mut seen = HashSet::new();
    let mut extensions = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<ExtensionInfo>(entry.clone()) {
            Ok(info) if info.id.is_empty() => {
                warn!("Skipping manifest entry {} with an empty id", index);
            }
            Ok(info) => {
                if seen.insert(info.id.clone()) {
                    extensions.push(info);
                } else {
                    warn!("Skipping duplicate manifest entry for '{}'", info.id);
                }
            }
            Err(e) => warn!("Skipping malformed manifest entry {}: {}", index, e),
        }
    }

    Ok(ExtensionManifest { extensions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use torigen_core::types::{ExtensionOrigin, SourceInfo};

    fn info(id: &str) -> ExtensionInfo {
        ExtensionInfo::local(&SourceInfo {
            id: id.to_string(),
            name: id.to_uppercase(),
            icon_url: String::new(),
            base_url: format!("https://{}.example", id),
            language: None,
        })
    }

    fn store(temp: &TempDir) -> ManifestStore {
        ManifestStore::spawn(temp.path().join("extensions").join("manifest.json"))
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent_and_keeps_content() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.ensure().await.unwrap();
        store.upsert(info("foo")).await.unwrap();
        store.ensure().await.unwrap();

        let manifest = store.load().await.unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(!store.path().with_extension("json.tmp").exists());
        let files: Vec<_> = std::fs::read_dir(temp.path().join("extensions"))
            .unwrap()
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_are_not_lost() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure().await.unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert(info(&format!("ext-{}", i))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_unreadable_manifest_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure().await.unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_and_duplicate_entries_are_skipped() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure().await.unwrap();
        std::fs::write(
            store.path(),
            r#"{
                "extensions": [
                    {"id": "a", "name": "A", "enabled": false},
                    {"name": "no id"},
                    {"id": "a", "name": "A duplicate", "enabled": true},
                    {"id": "b", "name": "B", "source": "remote"}
                ]
            }"#,
        )
        .unwrap();

        let manifest = store.load().await.unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("a").unwrap().name, "A");
        assert!(!manifest.get("a").unwrap().enabled);
        assert_eq!(manifest.get("b").unwrap().origin, ExtensionOrigin::Remote);
    }

    #[tokio::test]
    async fn test_upsert_keep_enabled() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure().await.unwrap();

        store.upsert(info("foo")).await.unwrap();
        assert!(store.set_enabled("foo", false).await.unwrap());

        let mut refreshed = info("foo");
        refreshed.name = "Foo 2".to_string();
        let stored = store.upsert_keep_enabled(refreshed).await.unwrap();
        assert!(!stored.enabled);

        let manifest = store.load().await.unwrap();
        assert_eq!(manifest.get("foo").unwrap().name, "Foo 2");
        assert!(!manifest.get("foo").unwrap().enabled);
    }

    #[tokio::test]
    async fn test_set_enabled_reports_unknown_ids() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure().await.unwrap();
        store.upsert(info("a")).await.unwrap();
        store.upsert(info("b")).await.unwrap();

        assert!(!store.set_enabled("missing", false).await.unwrap());

        let updated = store
            .set_enabled_many(&["a".to_string(), "nope".to_string()], false)
            .await
            .unwrap();
        assert_eq!(updated, vec!["a".to_string()]);

        let all = store.set_all_enabled(false).await.unwrap();
        assert_eq!(all.len(), 2);
        let manifest = store.load().await.unwrap();
        assert!(manifest.extensions.iter().all(|e| !e.enabled));
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure().await.unwrap();
        // Occupy the temporary path so the atomic write cannot happen
        std::fs::create_dir(temp.path().join("extensions").join("manifest.json.tmp")).unwrap();

        let result = store.upsert(info("foo")).await;
        assert!(matches!(result, Err(ExtensionError::ManifestWrite(_))));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_persists() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.ensure().await.unwrap();
        store.upsert(info("stale")).await.unwrap();
        store.upsert(info("kept")).await.unwrap();
        store.set_enabled("kept", false).await.unwrap();

        store
            .reconcile(vec![info("kept"), info("fresh")])
            .await
            .unwrap();

        let manifest = store.load().await.unwrap();
        assert!(!manifest.contains("stale"));
        assert!(!manifest.get("kept").unwrap().enabled);
        assert!(manifest.get("fresh").unwrap().enabled);
    }
}
