//! Source providers and loaded extensions

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use torigen_core::types::{
    Chapter, ChapterEntry, ExtensionInfo, Manga, PagedResults, SearchRequest, Section,
    SourceCapabilities, SourceInfo, Tag,
};

use crate::error::{ExtensionError, Result};
use crate::module::{
    ModuleExports, OperationInvoker, GET_CHAPTERS, GET_CHAPTER_DETAILS, GET_HOMEPAGE,
    GET_MANGA_DETAILS, GET_SEARCH_RESULTS, GET_SEARCH_TAGS,
};
use crate::validator::ProviderShape;

/// The content-retrieval contract every extension implements
#[async_trait]
pub trait SourceProvider: Send + Sync {
    fn info(&self) -> &SourceInfo;

    fn capabilities(&self) -> &SourceCapabilities;

    async fn get_homepage(&self) -> Result<Vec<Section>>;

    async fn get_manga_details(&self, manga_id: &str) -> Result<Manga>;

    async fn get_chapters(&self, manga_id: &str) -> Result<Vec<ChapterEntry>>;

    async fn get_chapter_details(&self, manga_id: &str, chapter_id: &str) -> Result<Chapter>;

    async fn get_search_results(&self, query: &SearchRequest) -> Result<PagedResults>;

    async fn get_search_tags(&self) -> Result<Vec<Tag>>;
}

/// A validated foreign module behind the [`SourceProvider`] contract
pub struct ForeignProvider {
    shape: ProviderShape,
    operations: BTreeSet<String>,
    invoker: Arc<dyn OperationInvoker>,
    call_timeout: Duration,
}

impl ForeignProvider {
    pub fn new(shape: ProviderShape, exports: ModuleExports, call_timeout: Duration) -> Self {
        Self {
            shape,
            operations: exports.operations,
            invoker: exports.invoker,
            call_timeout,
        }
    }

    pub fn shape(&self) -> &ProviderShape {
        &self.shape
    }

    async fn call<T: DeserializeOwned>(&self, operation: &str, args: Value) -> Result<T> {
        let id = &self.shape.info.id;
        if !self.operations.contains(operation) {
            return Err(ExtensionError::UnsupportedOperation {
                id: id.clone(),
                operation: operation.to_string(),
            });
        }

        let value = tokio::time::timeout(self.call_timeout, self.invoker.invoke(operation, args))
            .await
            .map_err(|_| ExtensionError::timeout(format!("{id}::{operation}"), self.call_timeout))?
            .map_err(|message| ExtensionError::provider(id, operation, message))?;

        serde_json::from_value(value).map_err(|e| {
            ExtensionError::provider(id, operation, format!("unexpected response shape: {e}"))
        })
    }
}

#[async_trait]
impl SourceProvider for ForeignProvider {
    fn info(&self) -> &SourceInfo {
        &self.shape.info
    }

    fn capabilities(&self) -> &SourceCapabilities {
        &self.shape.capabilities
    }

    async fn get_homepage(&self) -> Result<Vec<Section>> {
        self.call(GET_HOMEPAGE, json!({})).await
    }

    async fn get_manga_details(&self, manga_id: &str) -> Result<Manga> {
        self.call(GET_MANGA_DETAILS, json!({ "id": manga_id })).await
    }

    async fn get_chapters(&self, manga_id: &str) -> Result<Vec<ChapterEntry>> {
        self.call(GET_CHAPTERS, json!({ "mangaId": manga_id })).await
    }

    async fn get_chapter_details(&self, manga_id: &str, chapter_id: &str) -> Result<Chapter> {
        self.call(
            GET_CHAPTER_DETAILS,
            json!({ "mangaId": manga_id, "chapterId": chapter_id }),
        )
        .await
    }

    async fn get_search_results(&self, query: &SearchRequest) -> Result<PagedResults> {
        let args = serde_json::to_value(query).map_err(|e| {
            ExtensionError::provider(&self.shape.info.id, GET_SEARCH_RESULTS, e.to_string())
        })?;
        self.call(GET_SEARCH_RESULTS, args).await
    }

    async fn get_search_tags(&self) -> Result<Vec<Tag>> {
        self.call(GET_SEARCH_TAGS, json!({})).await
    }
}

impl fmt::Debug for ForeignProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignProvider")
            .field("id", &self.shape.info.id)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

/// A provider that loaded and validated, plus its metadata
#[derive(Clone)]
pub struct LoadedExtension {
    pub info: ExtensionInfo,
    pub source: Arc<dyn SourceProvider>,
    /// Set for local extensions only
    pub directory_path: Option<PathBuf>,
}

impl LoadedExtension {
    pub fn id(&self) -> &str {
        &self.info.id
    }
}

impl fmt::Debug for LoadedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedExtension")
            .field("info", &self.info)
            .field("directory_path", &self.directory_path)
            .finish_non_exhaustive()
    }
}
