//! On-disk layout under the data directory
//!
//! ```text
//! <root>/
//! ├── extensions/
//! │   ├── manifest.json
//! │   └── <dir>/index.wasm          local extensions
//! └── remote-extensions/
//!     ├── <id>.wasm                 cached remote extensions
//!     └── sources-list.json         last fetched catalog
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::loader::ENTRY_ARTIFACT;

pub const EXTENSIONS_DIR: &str = "extensions";
pub const REMOTE_CACHE_DIR: &str = "remote-extensions";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const CATALOG_CACHE_FILE: &str = "sources-list.json";

/// Resolves every path the extension manager touches
#[derive(Debug, Clone)]
pub struct ExtensionPaths {
    root: PathBuf,
}

impl ExtensionPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extensions_dir(&self) -> PathBuf {
        self.root.join(EXTENSIONS_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.extensions_dir().join(MANIFEST_FILE)
    }

    pub fn local_dir(&self, id: &str) -> PathBuf {
        self.extensions_dir().join(id)
    }

    pub fn local_entry(&self, id: &str) -> PathBuf {
        self.local_dir(id).join(ENTRY_ARTIFACT)
    }

    pub fn remote_dir(&self) -> PathBuf {
        self.root.join(REMOTE_CACHE_DIR)
    }

    pub fn remote_artifact(&self, id: &str) -> PathBuf {
        self.remote_dir().join(format!("{id}.wasm"))
    }

    /// Where a download waits until it validated
    pub fn staged_artifact(&self, id: &str) -> PathBuf {
        self.remote_dir().join(format!("{id}.wasm.staged"))
    }

    /// Where the previous artifact is parked while a new one is committed
    pub fn backup_artifact(&self, id: &str) -> PathBuf {
        self.remote_dir().join(format!("{id}.wasm.bak"))
    }

    pub fn catalog_cache(&self) -> PathBuf {
        self.remote_dir().join(CATALOG_CACHE_FILE)
    }

    /// Create the extension and remote cache directories
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(self.extensions_dir()).await?;
        tokio::fs::create_dir_all(self.remote_dir()).await
    }
}
