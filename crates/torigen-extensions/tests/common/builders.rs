//! Builders for mock artifacts and catalog entries

#![allow(dead_code)]

use serde_json::{json, Map, Value};
use torigen_core::types::{RemoteSourceInfo, RemoteSourcesList};
use torigen_extensions::module::{
    GET_CHAPTERS, GET_CHAPTER_DETAILS, GET_HOMEPAGE, GET_MANGA_DETAILS, GET_SEARCH_RESULTS,
    GET_SEARCH_TAGS, PROVIDER_OPERATIONS,
};

/// Builder for mock provider artifacts
///
/// The default artifact is a complete provider exporting every operation.
pub struct ArtifactBuilder {
    id: String,
    name: String,
    language: Option<String>,
    capabilities: Map<String, Value>,
    operations: Vec<String>,
    responses: Map<String, Value>,
    describe: Option<Option<Value>>,
    fail: Option<String>,
    stall: bool,
}

impl ArtifactBuilder {
    pub fn new(id: &str) -> Self {
        let mut responses = Map::new();
        responses.insert(
            GET_HOMEPAGE.to_string(),
            json!([{ "id": "popular", "title": "Popular", "items": [] }]),
        );
        responses.insert(
            GET_MANGA_DETAILS.to_string(),
            json!({ "id": "m1", "title": "Manga One" }),
        );
        responses.insert(
            GET_CHAPTERS.to_string(),
            json!([{ "id": "c1", "title": "Chapter 1", "number": 1.0 }]),
        );
        responses.insert(
            GET_CHAPTER_DETAILS.to_string(),
            json!({ "id": "c1", "mangaId": "m1", "pages": ["p1.jpg"] }),
        );
        responses.insert(
            GET_SEARCH_RESULTS.to_string(),
            json!({ "results": [], "totalCount": 0 }),
        );
        responses.insert(
            GET_SEARCH_TAGS.to_string(),
            json!([{ "id": "action", "label": "Action" }]),
        );

        Self {
            id: id.to_string(),
            name: format!("{} source", id),
            language: Some("en".to_string()),
            capabilities: Map::new(),
            operations: PROVIDER_OPERATIONS.iter().map(|op| op.to_string()).collect(),
            responses,
            describe: None,
            fail: None,
            stall: false,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_capability(mut self, key: &str, enabled: bool) -> Self {
        self.capabilities.insert(key.to_string(), Value::Bool(enabled));
        self
    }

    pub fn with_response(mut self, operation: &str, response: Value) -> Self {
        self.responses.insert(operation.to_string(), response);
        self
    }

    pub fn without_operation(mut self, operation: &str) -> Self {
        self.operations.retain(|op| op != operation);
        self
    }

    /// Replace the generated `describe` record
    pub fn with_describe(mut self, describe: Value) -> Self {
        self.describe = Some(Some(describe));
        self
    }

    pub fn without_describe(mut self) -> Self {
        self.describe = Some(None);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail = Some(message.to_string());
        self
    }

    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn describe_record(&self) -> Value {
        let mut info = json!({
            "id": self.id,
            "name": self.name,
            "iconUrl": format!("https://{}.example/icon.png", self.id),
            "baseUrl": format!("https://{}.example", self.id),
        });
        if let Some(language) = &self.language {
            info["language"] = Value::String(language.clone());
        }
        json!({ "info": info, "capabilities": self.capabilities })
    }

    pub fn build(&self) -> Vec<u8> {
        let describe = match &self.describe {
            Some(explicit) => explicit.clone(),
            None => Some(self.describe_record()),
        };
        let artifact = json!({
            "describe": describe,
            "operations": self.operations,
            "responses": self.responses,
            "fail": self.fail,
            "stall": self.stall,
        });
        serde_json::to_vec(&artifact).unwrap()
    }
}

/// Builder for remote catalog entries
pub struct RemoteSourceBuilder {
    source: RemoteSourceInfo,
}

impl RemoteSourceBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            source: RemoteSourceInfo {
                id: id.to_string(),
                name: format!("{} source", id),
                author: "Torigen Team".to_string(),
                description: format!("Remote source {}", id),
                version: "1.0.0".to_string(),
                icon_url: format!("https://{}.example/icon.png", id),
                base_url: format!("https://{}.example", id),
                source_url: code_url(id, "1.0.0"),
                download_url: None,
                tags: Vec::new(),
                min_app_version: None,
            },
        }
    }

    /// Set the version; the download URL follows it
    pub fn with_version(mut self, version: &str) -> Self {
        self.source.version = version.to_string();
        self.source.source_url = code_url(&self.source.id, version);
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.source.author = author.to_string();
        self
    }

    pub fn with_min_app_version(mut self, version: &str) -> Self {
        self.source.min_app_version = Some(version.to_string());
        self
    }

    pub fn build(self) -> RemoteSourceInfo {
        self.source
    }
}

/// Download URL used by [`RemoteSourceBuilder`]
pub fn code_url(id: &str, version: &str) -> String {
    format!("https://cdn.example/{}/{}.wasm", id, version)
}

/// Serialize a catalog document
pub fn catalog_document(sources: &[RemoteSourceInfo]) -> Vec<u8> {
    let list = RemoteSourcesList {
        sources: sources.to_vec(),
        version: "2026.1".to_string(),
        last_updated: "2026-01-01T00:00:00Z".to_string(),
    };
    serde_json::to_vec(&list).unwrap()
}
