//! Shared utility functions for Torigen crates

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

const MAX_ID_LEN: usize = 64;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "torigen", "torigen")
        .ok_or_else(|| Error::directory_unavailable("home"))
}

/// Get the application data directory (manifest, extensions, remote cache)
pub fn get_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Get the configuration directory (config.yaml)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Validate an extension id
///
/// Ids name directories and cache files, so they must be a single safe path
/// component: ASCII letters, digits, `-`, `_` and `.`, not starting with a dot.
pub fn validate_extension_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_extension_id(id, "id is empty"));
    }
    if id.len() > MAX_ID_LEN {
        return Err(Error::invalid_extension_id(
            id,
            format!("id is longer than {} characters", MAX_ID_LEN),
        ));
    }
    if id.starts_with('.') {
        return Err(Error::invalid_extension_id(id, "id must not start with '.'"));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(Error::invalid_extension_id(
            id,
            format!("character '{}' is not allowed", bad),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        for id in ["mangadex", "batoto-v2", "my_source", "source.en", "a1"] {
            assert!(validate_extension_id(id).is_ok(), "{} should be valid", id);
        }
    }

    #[test]
    fn test_invalid_ids() {
        for id in ["", "..", ".hidden", "../escape", "a/b", "a\\b", "sp ace", "é"] {
            assert!(
                validate_extension_id(id).is_err(),
                "{:?} should be rejected",
                id
            );
        }
        assert!(validate_extension_id(&"x".repeat(65)).is_err());
    }
}
