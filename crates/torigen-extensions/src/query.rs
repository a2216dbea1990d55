//! Filtering and sorting over loaded extensions

use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use torigen_core::types::Capability;

use crate::provider::LoadedExtension;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    Version,
    Author,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "version" => Ok(SortKey::Version),
            "author" => Ok(SortKey::Author),
            other => Err(format!(
                "Unknown sort key '{}'. Valid keys: name, version, author",
                other
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Version => write!(f, "version"),
            SortKey::Author => write!(f, "author"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Extensions whose provider declares `capability`
pub fn by_capability(
    extensions: Vec<LoadedExtension>,
    capability: Capability,
) -> Vec<LoadedExtension> {
    extensions
        .into_iter()
        .filter(|ext| ext.source.capabilities().supports(capability))
        .collect()
}

/// Extensions serving `language`; a provider declaring "multi" matches all
pub fn by_language(extensions: Vec<LoadedExtension>, language: &str) -> Vec<LoadedExtension> {
    extensions
        .into_iter()
        .filter(|ext| ext.source.info().supports_language(language))
        .collect()
}

/// Sort in place by `key`; ties keep id order
pub fn sort(extensions: &mut [LoadedExtension], key: SortKey, order: SortOrder) {
    extensions.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Name => a
                .info
                .name
                .to_lowercase()
                .cmp(&b.info.name.to_lowercase()),
            SortKey::Version => {
                compare_versions(a.info.version.as_deref(), b.info.version.as_deref())
            }
            SortKey::Author => author_key(a).cmp(&author_key(b)),
        };
        let ordering = ordering.then_with(|| a.info.id.cmp(&b.info.id));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

fn author_key(ext: &LoadedExtension) -> String {
    ext.info.author.as_deref().unwrap_or_default().to_lowercase()
}

/// Semantic comparison when both parse, string comparison otherwise.
/// Missing versions sort first.
pub fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (parse_version(a), parse_version(b)) {
            (Some(va), Some(vb)) => va.cmp(&vb),
            _ => a.cmp(b),
        },
    }
}

/// Lenient semver parse: "1.0" and "v2" are accepted as "1.0.0" and "2.0.0"
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }
    let mut parts = trimmed.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() {
        return None;
    }
    Some(Version::new(major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_is_lenient() {
        assert_eq!(parse_version("1.0"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_version("v2"), Some(Version::new(2, 0, 0)));
        assert_eq!(parse_version("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_version("1.2.3.4"), None);
        assert_eq!(parse_version("latest"), None);
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions(Some("1.10"), Some("1.9")), Ordering::Greater);
        assert_eq!(compare_versions(Some("1.0"), Some("1.0.0")), Ordering::Equal);
        assert_eq!(compare_versions(None, Some("0.1")), Ordering::Less);
        assert_eq!(compare_versions(Some("beta"), Some("alpha")), Ordering::Greater);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Version".parse::<SortKey>(), Ok(SortKey::Version));
        assert!("size".parse::<SortKey>().is_err());
    }
}
