//! Extension lifecycle management
//!
//! [`ExtensionManager`] drives discovery, install, update, uninstall and
//! enable/disable, keeping the manifest (durable) and the registry (live)
//! consistent.
//!
//! Concurrency:
//! - discovery takes the lifecycle gate exclusively, so it never overlaps
//!   with any other operation
//! - per-id operations share the gate and then take that id's operation
//!   lock, so at most one of them runs per id
//! - manifest writes are serialized by the manifest task
//!
//! Install and update are staged: the download is written next to the
//! cache, validated, and only then swapped in. The previous artifact is kept
//! as a backup until the manifest records the change, and restored if that
//! write fails.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use torigen_core::types::{Capability, ExtensionInfo, ExtensionManifest, RemoteSourceInfo};
use torigen_core::{validate_extension_id, RuntimeConfig};
use tracing::{debug, info, warn};

use crate::catalog::RemoteCatalog;
use crate::error::{ExtensionError, FetchError, LoadError, Result};
use crate::fetch::{fetch_with_timeout, Fetcher, HttpFetcher};
use crate::loader::ProviderLoader;
use crate::locks::OperationLocks;
use crate::manifest::ManifestStore;
use crate::module::ModuleEvaluator;
use crate::paths::ExtensionPaths;
use crate::provider::{LoadedExtension, SourceProvider};
use crate::query::{self, compare_versions, parse_version, SortKey, SortOrder};
use crate::reconcile::reconcile;
use crate::registry::Registry;
use crate::template;
use crate::wasm::WasmEvaluator;

/// One extension that discovery had to skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    pub location: PathBuf,
    pub reason: String,
}

/// Outcome of a discovery pass
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Extensions now in the registry, with reconciled metadata
    pub loaded: Vec<ExtensionInfo>,
    pub failures: Vec<DiscoveryFailure>,
    /// Problems that did not cost an extension (e.g. manifest write failure)
    pub warnings: Vec<String>,
}

impl DiscoveryReport {
    fn fail(&mut self, location: impl Into<PathBuf>, reason: impl Into<String>) {
        let failure = DiscoveryFailure {
            location: location.into(),
            reason: reason.into(),
        };
        warn!(
            "Skipping extension at {}: {}",
            failure.location.display(),
            failure.reason
        );
        self.failures.push(failure);
    }
}

/// Outcome of an uninstall
#[derive(Debug, Clone)]
pub struct UninstallOutcome {
    pub info: ExtensionInfo,
    /// Set when the cached artifact could not be deleted
    pub cleanup_warning: Option<String>,
}

/// A remote extension whose catalog version differs from the installed one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    pub id: String,
    pub name: String,
    pub installed: Option<String>,
    pub available: String,
}

/// Owns the registry, the manifest task and the remote catalog
pub struct ExtensionManager {
    paths: ExtensionPaths,
    app_version: String,
    download_timeout: Duration,
    max_concurrent_loads: usize,
    loader: ProviderLoader,
    fetcher: Arc<dyn Fetcher>,
    manifest: ManifestStore,
    registry: Registry,
    catalog: RemoteCatalog,
    locks: OperationLocks,
    gate: RwLock<()>,
}

impl ExtensionManager {
    /// Create a manager rooted at `root` with injected evaluation and network
    /// capabilities. Must be called inside a tokio runtime.
    pub fn new(
        root: impl Into<PathBuf>,
        config: &RuntimeConfig,
        evaluator: Arc<dyn ModuleEvaluator>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let paths = ExtensionPaths::new(root);
        let manifest = ManifestStore::spawn(paths.manifest_path());
        let catalog = RemoteCatalog::new(
            config.catalog.url.clone(),
            paths.catalog_cache(),
            Arc::clone(&fetcher),
            config.network.download_timeout(),
            config.catalog.cache_ttl(),
        );

        Self {
            app_version: config.app_version.clone(),
            download_timeout: config.network.download_timeout(),
            max_concurrent_loads: config.loader.max_concurrent_loads.max(1),
            loader: ProviderLoader::new(evaluator, &config.loader),
            fetcher,
            manifest,
            registry: Registry::new(),
            catalog,
            locks: OperationLocks::new(),
            gate: RwLock::new(()),
            paths,
        }
    }

    /// Create a manager with the WASM evaluator and HTTP fetcher
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let root = config.resolve_data_dir()?;
        let fetcher = HttpFetcher::new(&config.network)
            .map_err(|e| ExtensionError::fetch(&config.catalog.url, e))?;
        let evaluator = WasmEvaluator::from_config(&config.loader);

        Ok(Self::new(root, config, Arc::new(evaluator), Arc::new(fetcher)))
    }

    pub fn paths(&self) -> &ExtensionPaths {
        &self.paths
    }

    pub fn manifest(&self) -> &ManifestStore {
        &self.manifest
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn catalog(&self) -> &RemoteCatalog {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    /// Discover every local and remote extension, reconcile the manifest and
    /// rebuild the registry
    ///
    /// A failing extension is recorded in the report and skipped; the pass
    /// itself only fails if the data directories cannot be created.
    pub async fn load_all(&self) -> Result<DiscoveryReport> {
        let _gate = self.gate.write().await;

        self.paths.ensure_dirs().await?;
        self.manifest.ensure().await?;

        let mut report = DiscoveryReport::default();
        let mut loaded: Vec<LoadedExtension> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (dir, result) in self.load_local_extensions(&mut report).await {
            match result {
                Ok(ext) if !seen.insert(ext.info.id.clone()) => {
                    report.fail(dir, format!("duplicate extension id '{}'", ext.info.id));
                }
                Ok(ext) => loaded.push(ext),
                Err(e) => report.fail(dir, e.to_string()),
            }
        }

        let snapshot = self.manifest.load().await?;
        for entry in snapshot.remote_entries() {
            if let Err(e) = validate_extension_id(&entry.id) {
                report.fail(self.paths.manifest_path(), e.to_string());
                continue;
            }

            let artifact = self.paths.remote_artifact(&entry.id);
            if seen.contains(&entry.id) {
                report.fail(
                    artifact,
                    format!("remote extension '{}' is shadowed by a local one", entry.id),
                );
                continue;
            }

            match self.load_remote_extension(entry, &artifact).await {
                Ok(ext) => {
                    seen.insert(entry.id.clone());
                    loaded.push(ext);
                }
                Err(e) => report.fail(artifact, e.to_string()),
            }
        }

        let discovered: Vec<ExtensionInfo> = loaded.iter().map(|ext| ext.info.clone()).collect();
        let reconciled = match self.manifest.reconcile(discovered.clone()).await {
            Ok(manifest) => {
                self.discard_orphaned_artifacts(&snapshot, &manifest).await;
                manifest
            }
            Err(e) => {
                warn!("Failed to persist reconciled manifest: {}", e);
                report.warnings.push(e.to_string());
                reconcile(&snapshot, &discovered)
            }
        };

        for ext in &mut loaded {
            if let Some(info) = reconciled.get(&ext.info.id) {
                ext.info = info.clone();
            }
        }

        report.loaded = loaded.iter().map(|ext| ext.info.clone()).collect();
        self.registry.replace_all(loaded);

        info!(
            "Loaded {} extensions ({} skipped)",
            report.loaded.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Delete cached code of remote entries that reconciliation dropped or
    /// turned local
    async fn discard_orphaned_artifacts(
        &self,
        before: &ExtensionManifest,
        after: &ExtensionManifest,
    ) {
        for entry in before.remote_entries() {
            if validate_extension_id(&entry.id).is_err() {
                continue;
            }
            if after.get(&entry.id).is_some_and(|kept| kept.is_remote()) {
                continue;
            }
            let artifact = self.paths.remote_artifact(&entry.id);
            if tokio::fs::try_exists(&artifact).await.unwrap_or(false) {
                warn!(
                    "Removing cached artifact of dropped extension {}: {}",
                    entry.id,
                    artifact.display()
                );
                discard(&artifact).await;
            }
        }
    }

    async fn load_local_extensions(
        &self,
        report: &mut DiscoveryReport,
    ) -> Vec<(PathBuf, std::result::Result<LoadedExtension, LoadError>)> {
        let dirs = match self.local_extension_dirs().await {
            Ok(dirs) => dirs,
            Err(e) => {
                let message = format!(
                    "Failed to list {}: {}",
                    self.paths.extensions_dir().display(),
                    e
                );
                warn!("{}", message);
                report.warnings.push(message);
                return Vec::new();
            }
        };
        debug!("Found {} local extension directories", dirs.len());

        stream::iter(dirs)
            .map(|dir| async move {
                let result = self.loader.load_local(&dir).await;
                (dir, result)
            })
            .buffered(self.max_concurrent_loads)
            .collect()
            .await
    }

    async fn local_extension_dirs(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(self.paths.extensions_dir()).await?;
        let mut dirs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type().await?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn load_remote_extension(
        &self,
        entry: &ExtensionInfo,
        artifact: &Path,
    ) -> std::result::Result<LoadedExtension, LoadError> {
        let provider = self.loader.load_file(artifact).await?;
        let declared = &provider.info().id;
        if declared != &entry.id {
            return Err(LoadError::IdMismatch {
                expected: entry.id.clone(),
                actual: declared.clone(),
            });
        }

        Ok(LoadedExtension {
            info: entry.clone(),
            source: Arc::new(provider),
            directory_path: None,
        })
    }

    // ------------------------------------------------------------------
    // Install / update / uninstall
    // ------------------------------------------------------------------

    /// Install a remote extension from its catalog entry
    ///
    /// All-or-nothing: on any failure neither the registry nor the manifest
    /// changes, and a previously cached artifact is left in place.
    pub async fn install(&self, source: &RemoteSourceInfo) -> Result<LoadedExtension> {
        validate_extension_id(&source.id)?;
        self.check_compatibility(source)?;

        let _gate = self.gate.read().await;
        let _lock = self.locks.acquire(&source.id).await;

        if let Some(dir) = self.local_conflict(&source.id).await? {
            return Err(ExtensionError::AlreadyExists(dir));
        }

        let loaded = self.install_staged(source, false).await?;
        info!("Installed {} {}", source.id, source.version);
        Ok(loaded)
    }

    /// Directory of a local extension already using `id`, whether or not
    /// discovery has run yet
    async fn local_conflict(&self, id: &str) -> Result<Option<PathBuf>> {
        if let Some(existing) = self.registry.get(id) {
            if !existing.info.is_remote() {
                let dir = existing
                    .directory_path
                    .unwrap_or_else(|| self.paths.local_dir(id));
                return Ok(Some(dir));
            }
        }

        let manifest = self.manifest.load().await?;
        if manifest.get(id).is_some_and(|entry| !entry.is_remote()) {
            return Ok(Some(self.paths.local_dir(id)));
        }

        let dir = self.paths.local_dir(id);
        if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(Some(dir));
        }
        Ok(None)
    }

    /// Install by id, looking the entry up in the remote catalog
    pub async fn install_from_catalog(&self, id: &str) -> Result<LoadedExtension> {
        let source = self
            .catalog
            .find(id)
            .await
            .ok_or_else(|| ExtensionError::NotInCatalog(id.to_string()))?;
        self.install(&source).await
    }

    /// Update a remote extension to the catalog's current version
    ///
    /// Equal versions return the loaded instance untouched. Otherwise the new
    /// version is staged and validated before it replaces the old one, so a
    /// failed update leaves the installed version working. The user's
    /// `enabled` flag is kept.
    pub async fn update(&self, id: &str) -> Result<LoadedExtension> {
        validate_extension_id(id)?;

        let _gate = self.gate.read().await;
        let _lock = self.locks.acquire(id).await;

        let manifest = self.manifest.load().await?;
        let entry = manifest
            .get(id)
            .ok_or_else(|| ExtensionError::NotInstalled(id.to_string()))?;
        if !entry.is_remote() || entry.source_url.is_none() {
            return Err(ExtensionError::NotRemote(id.to_string()));
        }

        let remote = self
            .catalog
            .find(id)
            .await
            .ok_or_else(|| ExtensionError::NotInCatalog(id.to_string()))?;

        if compare_versions(entry.version.as_deref(), Some(&remote.version)) == Ordering::Equal {
            if let Some(loaded) = self.registry.get(id) {
                info!("Extension {} is already up to date", id);
                return Ok(loaded);
            }
            debug!("Extension {} is current but not loaded, reinstalling", id);
        }

        self.check_compatibility(&remote)?;
        let loaded = self.install_staged(&remote, true).await?;
        info!(
            "Updated {} {} -> {}",
            id,
            entry.version.as_deref().unwrap_or("unknown"),
            remote.version
        );
        Ok(loaded)
    }

    /// Uninstall a remote extension
    ///
    /// The manifest entry goes first; if that write fails nothing else
    /// changes. Deleting the cached artifact is best-effort.
    pub async fn uninstall(&self, id: &str) -> Result<UninstallOutcome> {
        validate_extension_id(id)?;

        let _gate = self.gate.read().await;
        let _lock = self.locks.acquire(id).await;

        let manifest = self.manifest.load().await?;
        let entry = manifest
            .get(id)
            .cloned()
            .or_else(|| self.registry.get(id).map(|ext| ext.info))
            .ok_or_else(|| ExtensionError::NotInstalled(id.to_string()))?;
        if !entry.is_remote() {
            return Err(ExtensionError::NotRemote(id.to_string()));
        }

        self.manifest.remove(id).await?;
        self.registry.remove(id);

        let artifact = self.paths.remote_artifact(id);
        let cleanup_warning = match tokio::fs::remove_file(&artifact).await {
            Ok(()) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                let message = format!(
                    "Failed to delete cached artifact {}: {}",
                    artifact.display(),
                    e
                );
                warn!("{}", message);
                Some(message)
            }
        };

        info!("Uninstalled {}", id);
        Ok(UninstallOutcome {
            info: entry,
            cleanup_warning,
        })
    }

    async fn install_staged(
        &self,
        source: &RemoteSourceInfo,
        keep_enabled: bool,
    ) -> Result<LoadedExtension> {
        let id = &source.id;
        self.paths.ensure_dirs().await?;

        let url = source.code_url();
        let code = fetch_with_timeout(self.fetcher.as_ref(), url, self.download_timeout)
            .await
            .map_err(|e| match e {
                FetchError::Timeout(after) => {
                    ExtensionError::timeout(format!("Download of {}", url), after)
                }
                other => ExtensionError::fetch(url, other),
            })?;
        debug!("Downloaded {} ({} bytes)", url, code.len());

        let staged = self.paths.staged_artifact(id);
        tokio::fs::write(&staged, &code).await?;

        let provider = match self.loader.load_file(&staged).await {
            Ok(provider) if &provider.info().id != id => {
                let actual = provider.info().id.clone();
                discard(&staged).await;
                return Err(ExtensionError::load(
                    id,
                    LoadError::IdMismatch {
                        expected: id.clone(),
                        actual,
                    },
                ));
            }
            Ok(provider) => provider,
            Err(e) => {
                discard(&staged).await;
                return Err(ExtensionError::load(id, e));
            }
        };

        let info = self.commit(source, &staged, keep_enabled).await?;
        let loaded = LoadedExtension {
            info,
            source: Arc::new(provider),
            directory_path: None,
        };
        self.registry.put(loaded.clone());
        Ok(loaded)
    }

    /// Swap the staged artifact in and record it in the manifest
    async fn commit(
        &self,
        source: &RemoteSourceInfo,
        staged: &Path,
        keep_enabled: bool,
    ) -> Result<ExtensionInfo> {
        let id = &source.id;
        let target = self.paths.remote_artifact(id);
        let backup = self.paths.backup_artifact(id);

        let had_previous = tokio::fs::try_exists(&target).await.unwrap_or(false);
        if had_previous {
            if let Err(e) = tokio::fs::rename(&target, &backup).await {
                discard(staged).await;
                return Err(e.into());
            }
        }

        if let Err(e) = tokio::fs::rename(staged, &target).await {
            discard(staged).await;
            self.restore_artifact(id, had_previous).await;
            return Err(e.into());
        }

        let info = ExtensionInfo::remote(source, Utc::now());
        let recorded = if keep_enabled {
            self.manifest.upsert_keep_enabled(info).await
        } else {
            self.manifest.upsert(info).await
        };

        match recorded {
            Ok(info) => {
                if had_previous {
                    discard(&backup).await;
                }
                Ok(info)
            }
            Err(e) => {
                warn!("Rolling back {}: {}", id, e);
                self.restore_artifact(id, had_previous).await;
                Err(e)
            }
        }
    }

    /// Put the backed-up artifact back (or remove the new one if there was none)
    async fn restore_artifact(&self, id: &str, had_previous: bool) {
        let target = self.paths.remote_artifact(id);
        if had_previous {
            if let Err(e) = tokio::fs::rename(self.paths.backup_artifact(id), &target).await {
                warn!("Failed to restore previous artifact for {}: {}", id, e);
            }
        } else {
            discard(&target).await;
        }
    }

    fn check_compatibility(&self, source: &RemoteSourceInfo) -> Result<()> {
        let Some(required) = source.min_app_version.as_deref() else {
            return Ok(());
        };

        match (parse_version(required), parse_version(&self.app_version)) {
            (Some(required_version), Some(current)) if current < required_version => {
                Err(ExtensionError::Incompatible {
                    id: source.id.clone(),
                    required: required.to_string(),
                    current: self.app_version.clone(),
                })
            }
            (Some(_), Some(_)) => Ok(()),
            _ => {
                warn!(
                    "Cannot compare app version {} with {}'s minimum {}; allowing install",
                    self.app_version, source.id, required
                );
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Enable / disable
    // ------------------------------------------------------------------

    /// Enable or disable one extension; the manifest is updated first
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let _gate = self.gate.read().await;
        let _lock = self.locks.acquire(id).await;

        if !self.manifest.set_enabled(id, enabled).await? {
            return Err(ExtensionError::NotInstalled(id.to_string()));
        }
        self.registry.set_enabled(id, enabled);

        info!("{} {}", if enabled { "Enabled" } else { "Disabled" }, id);
        Ok(())
    }

    /// Enable or disable several extensions; returns the ids that exist
    pub async fn set_enabled_many(&self, ids: &[String], enabled: bool) -> Result<Vec<String>> {
        let _gate = self.gate.read().await;
        let _locks = self.locks.acquire_many(ids).await;

        let updated = self.manifest.set_enabled_many(ids, enabled).await?;
        for id in &updated {
            self.registry.set_enabled(id, enabled);
        }
        for id in ids.iter().filter(|id| !updated.contains(id)) {
            warn!("Extension {} is not installed", id);
        }
        Ok(updated)
    }

    /// Enable or disable every known extension
    pub async fn set_all_enabled(&self, enabled: bool) -> Result<Vec<String>> {
        let _gate = self.gate.read().await;
        let ids: Vec<String> = self
            .manifest
            .load()
            .await?
            .extensions
            .into_iter()
            .map(|ext| ext.id)
            .collect();
        let _locks = self.locks.acquire_many(&ids).await;

        let updated = self.manifest.set_all_enabled(enabled).await?;
        for id in &updated {
            self.registry.set_enabled(id, enabled);
        }
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<LoadedExtension> {
        self.registry.get(id)
    }

    pub fn get_all(&self) -> Vec<LoadedExtension> {
        self.registry.get_all()
    }

    pub fn get_all_enabled(&self) -> Vec<LoadedExtension> {
        self.registry.get_all_enabled()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn filter_by_capability(&self, capability: Capability) -> Vec<LoadedExtension> {
        query::by_capability(self.registry.get_all(), capability)
    }

    pub fn filter_by_language(&self, language: &str) -> Vec<LoadedExtension> {
        query::by_language(self.registry.get_all(), language)
    }

    pub fn find(&self, predicate: impl Fn(&LoadedExtension) -> bool) -> Option<LoadedExtension> {
        self.registry.get_all().into_iter().find(|ext| predicate(ext))
    }

    pub fn sorted(&self, key: SortKey, order: SortOrder) -> Vec<LoadedExtension> {
        let mut all = self.registry.get_all();
        query::sort(&mut all, key, order);
        all
    }

    /// Remote extensions whose catalog version differs from the installed one
    pub async fn check_updates(&self) -> Result<Vec<AvailableUpdate>> {
        let manifest = self.manifest.load().await?;
        let sources = self.catalog.available_sources().await;

        Ok(manifest
            .remote_entries()
            .filter_map(|entry| {
                let remote = sources.iter().find(|source| source.id == entry.id)?;
                let current =
                    compare_versions(entry.version.as_deref(), Some(&remote.version));
                (current != Ordering::Equal).then(|| AvailableUpdate {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    installed: entry.version.clone(),
                    available: remote.version.clone(),
                })
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Developer tooling
    // ------------------------------------------------------------------

    /// Scaffold a local extension in `extensions/<id>/`
    ///
    /// Never touches the manifest or the registry.
    pub async fn create_template(&self, id: &str) -> Result<Vec<PathBuf>> {
        template::create_template(&self.paths.local_dir(id), id).await
    }
}

impl std::fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionManager")
            .field("root", &self.paths.root())
            .field("loaded", &self.registry.len())
            .finish_non_exhaustive()
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
