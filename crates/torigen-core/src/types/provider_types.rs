//! Provider-side types
//!
//! These are the JSON shapes exchanged with content-source providers. Field
//! names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language key that matches every language filter
pub const MULTI_LANGUAGE: &str = "multi";

/// Identity a provider declares about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon_url: String,
    pub base_url: String,
    /// Content language key (e.g. "en"), or "multi"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SourceInfo {
    /// Check whether this provider serves the given language
    pub fn supports_language(&self, key: &str) -> bool {
        match &self.language {
            Some(lang) => {
                lang.eq_ignore_ascii_case(key) || lang.eq_ignore_ascii_case(MULTI_LANGUAGE)
            }
            None => false,
        }
    }
}

/// Optional features a provider declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceCapabilities {
    pub supports_homepage: bool,
    pub supports_search: bool,
    pub supports_view_more: bool,
    pub support_include_tags: bool,
    pub support_exclude_tags: bool,
    pub support_pagination: bool,
}

impl SourceCapabilities {
    /// Check a single capability flag
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Homepage => self.supports_homepage,
            Capability::Search => self.supports_search,
            Capability::ViewMore => self.supports_view_more,
            Capability::IncludeTags => self.support_include_tags,
            Capability::ExcludeTags => self.support_exclude_tags,
            Capability::Pagination => self.support_pagination,
        }
    }

    /// All capabilities that are switched on
    pub fn enabled(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|cap| self.supports(*cap))
            .collect()
    }
}

/// One capability flag, addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Homepage,
    Search,
    ViewMore,
    IncludeTags,
    ExcludeTags,
    Pagination,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Homepage,
        Capability::Search,
        Capability::ViewMore,
        Capability::IncludeTags,
        Capability::ExcludeTags,
        Capability::Pagination,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Homepage => write!(f, "homepage"),
            Capability::Search => write!(f, "search"),
            Capability::ViewMore => write!(f, "view-more"),
            Capability::IncludeTags => write!(f, "include-tags"),
            Capability::ExcludeTags => write!(f, "exclude-tags"),
            Capability::Pagination => write!(f, "pagination"),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "homepage" | "home" => Ok(Capability::Homepage),
            "search" => Ok(Capability::Search),
            "view-more" | "viewmore" => Ok(Capability::ViewMore),
            "include-tags" => Ok(Capability::IncludeTags),
            "exclude-tags" => Ok(Capability::ExcludeTags),
            "pagination" => Ok(Capability::Pagination),
            other => Err(format!(
                "Unknown capability '{}'. Valid capabilities: homepage, search, view-more, include-tags, exclude-tags, pagination",
                other
            )),
        }
    }
}

/// Lightweight manga reference used in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

/// A homepage section (e.g. "Popular", "Latest updates")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub items: Vec<MangaEntry>,
    #[serde(default)]
    pub contains_more_items: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub manga_id: String,
    #[serde(default)]
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagedResults {
    pub results: Vec<MangaEntry>,
    pub total_count: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub limit: u32,
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_parsing() {
        assert_eq!("search".parse::<Capability>(), Ok(Capability::Search));
        assert_eq!("view_more".parse::<Capability>(), Ok(Capability::ViewMore));
        assert_eq!(
            "Include-Tags".parse::<Capability>(),
            Ok(Capability::IncludeTags)
        );
        assert!("teleport".parse::<Capability>().is_err());

        for cap in Capability::ALL {
            assert_eq!(cap.to_string().parse::<Capability>(), Ok(cap));
        }
    }

    #[test]
    fn test_capabilities_wire_names() {
        let caps: SourceCapabilities = serde_json::from_str(
            r#"{"supportsHomepage": true, "supportsSearch": true, "supportPagination": true}"#,
        )
        .unwrap();

        assert_eq!(
            caps.enabled(),
            vec![
                Capability::Homepage,
                Capability::Search,
                Capability::Pagination
            ]
        );
        assert!(!caps.supports(Capability::ViewMore));
    }

    #[test]
    fn test_multi_language_matches_everything() {
        let mut info = SourceInfo {
            id: "x".to_string(),
            name: "X".to_string(),
            icon_url: String::new(),
            base_url: "https://x.example".to_string(),
            language: Some("multi".to_string()),
        };
        assert!(info.supports_language("en"));
        assert!(info.supports_language("ja"));

        info.language = Some("en".to_string());
        assert!(info.supports_language("EN"));
        assert!(!info.supports_language("ja"));

        info.language = None;
        assert!(!info.supports_language("en"));
    }
}
