//! Local extension scaffold
//!
//! Writes a ready-to-build Extism plugin crate into `extensions/<id>/`. The
//! generated provider implements every contract operation with placeholder
//! behaviour. Building it to `index.wasm` in the same directory makes it
//! discoverable.
//!
//! Templates use simple `{var}` replacement.

use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use torigen_core::validate_extension_id;
use tracing::info;

use crate::error::{ExtensionError, Result};
use crate::loader::ENTRY_ARTIFACT;

const CARGO_TOML_TEMPLATE: &str = r#"[package]
name = "{package_name}"
version = "0.1.0"
edition = "2021"
description = "{display_name} source for Torigen"

[lib]
crate-type = ["cdylib"]

[dependencies]
extism-pdk = "1"
serde_json = "1"

[profile.release]
opt-level = "s"
lto = true
"#;

const LIB_RS_TEMPLATE: &str = r#"use extism_pdk::*;
use serde_json::{json, Value};

#[plugin_fn]
pub fn describe() -> FnResult<Json<Value>> {
    Ok(Json(json!({
        "info": {
            "id": "{extension_id}",
            "name": "{display_name}",
            "iconUrl": "https://example.com/favicon.ico",
            "baseUrl": "https://example.com"
        },
        "capabilities": {
            "supportsHomepage": true,
            "supportsSearch": true,
            "supportsViewMore": false,
            "supportIncludeTags": false,
            "supportExcludeTags": false,
            "supportPagination": false
        }
    })))
}

#[plugin_fn]
pub fn get_homepage(_args: Json<Value>) -> FnResult<Json<Value>> {
    Ok(Json(json!([])))
}

#[plugin_fn]
pub fn get_manga_details(args: Json<Value>) -> FnResult<Json<Value>> {
    let id = args.0["id"].as_str().unwrap_or_default().to_string();
    Err(WithReturnCode::new(Error::msg(format!("manga details not implemented: {id}")), 1))
}

#[plugin_fn]
pub fn get_chapters(_args: Json<Value>) -> FnResult<Json<Value>> {
    Ok(Json(json!([])))
}

#[plugin_fn]
pub fn get_chapter_details(_args: Json<Value>) -> FnResult<Json<Value>> {
    Err(WithReturnCode::new(Error::msg("chapter details not implemented"), 1))
}

#[plugin_fn]
pub fn get_search_results(_args: Json<Value>) -> FnResult<Json<Value>> {
    Ok(Json(json!({
        "results": [],
        "totalCount": 0,
        "hasNextPage": false,
        "hasPreviousPage": false,
        "limit": 32,
        "offset": 0
    })))
}

#[plugin_fn]
pub fn get_search_tags(_args: Json<Value>) -> FnResult<Json<Value>> {
    Ok(Json(json!([])))
}
"#;

const README_TEMPLATE: &str = r#"# {display_name}

Torigen source `{extension_id}`, scaffolded on {date}.

## Build

```sh
rustup target add wasm32-unknown-unknown
cargo build --release --target wasm32-unknown-unknown
cp target/wasm32-unknown-unknown/release/{artifact_name}.wasm index.wasm
```

Then run `torigen extension reload`.
"#;

/// Files written by the scaffold, relative to the extension directory
const TEMPLATE_FILES: [(&str, &str); 3] = [
    ("Cargo.toml", CARGO_TOML_TEMPLATE),
    ("src/lib.rs", LIB_RS_TEMPLATE),
    ("README.md", README_TEMPLATE),
];

/// Variables substituted into the scaffold
#[derive(Debug, Clone)]
pub struct TemplateVars {
    pub extension_id: String,
    pub package_name: String,
    pub artifact_name: String,
    pub display_name: String,
    pub date: String,
}

impl TemplateVars {
    pub fn new(extension_id: &str) -> Self {
        let package_name =
            format!("torigen-source-{}", extension_id.replace('.', "-")).to_ascii_lowercase();
        Self {
            extension_id: extension_id.to_string(),
            artifact_name: package_name.replace('-', "_"),
            package_name,
            display_name: display_name(extension_id),
            date: Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Render a `{var}` template
pub fn render_string(template: &str, vars: &TemplateVars) -> String {
    template
        .replace("{extension_id}", &vars.extension_id)
        .replace("{package_name}", &vars.package_name)
        .replace("{artifact_name}", &vars.artifact_name)
        .replace("{display_name}", &vars.display_name)
        .replace("{date}", &vars.date)
}

/// Scaffold a new local extension in `dir`, returning the created files
///
/// Refuses to touch a directory that already holds an entry artifact or a
/// previous scaffold.
pub async fn create_template(dir: &Path, extension_id: &str) -> Result<Vec<PathBuf>> {
    validate_extension_id(extension_id)?;

    for existing in [ENTRY_ARTIFACT, "Cargo.toml"] {
        let path = dir.join(existing);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ExtensionError::AlreadyExists(path));
        }
    }

    let vars = TemplateVars::new(extension_id);
    let mut created = Vec::with_capacity(TEMPLATE_FILES.len());

    for (relative, template) in TEMPLATE_FILES {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = render_string(template, &vars);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => ExtensionError::AlreadyExists(path.clone()),
                _ => ExtensionError::Io(e),
            })?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        created.push(path);
    }

    info!("Created extension template '{}' in {}", extension_id, dir.display());
    Ok(created)
}

fn display_name(id: &str) -> String {
    id.split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_vars() {
        let vars = TemplateVars::new("manga-plus");
        assert_eq!(vars.package_name, "torigen-source-manga-plus");
        assert_eq!(vars.artifact_name, "torigen_source_manga_plus");
        assert_eq!(vars.display_name, "Manga Plus");
        assert_eq!(display_name("mangadex"), "Mangadex");
    }

    #[test]
    fn test_render_string() {
        let vars = TemplateVars::new("demo");
        let rendered = render_string(LIB_RS_TEMPLATE, &vars);
        assert!(rendered.contains(r#""id": "demo""#));
        assert!(!rendered.contains("{extension_id}"));
        assert!(!rendered.contains("{display_name}"));
        for op in crate::module::PROVIDER_OPERATIONS {
            assert!(rendered.contains(&format!("pub fn {}(", op)), "missing {}", op);
        }
        assert!(rendered.contains("pub fn describe("));
    }

    #[tokio::test]
    async fn test_create_template_writes_crate() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("demo");

        let files = create_template(&dir, "demo").await.unwrap();
        assert_eq!(files.len(), 3);

        let cargo = std::fs::read_to_string(dir.join("Cargo.toml")).unwrap();
        assert!(cargo.contains(r#"name = "torigen-source-demo""#));
        let readme = std::fs::read_to_string(dir.join("README.md")).unwrap();
        assert!(readme.contains("torigen_source_demo.wasm"));
        assert!(!dir.join(ENTRY_ARTIFACT).exists());
    }

    #[tokio::test]
    async fn test_create_template_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("demo");
        create_template(&dir, "demo").await.unwrap();

        let result = create_template(&dir, "demo").await;
        assert!(matches!(result, Err(ExtensionError::AlreadyExists(_))));

        let other = temp.path().join("built");
        std::fs::create_dir_all(&other).unwrap();
        std::fs::write(other.join(ENTRY_ARTIFACT), b"\0asm").unwrap();
        let result = create_template(&other, "built").await;
        assert!(matches!(result, Err(ExtensionError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_create_template_rejects_bad_id() {
        let temp = TempDir::new().unwrap();
        let result = create_template(temp.path(), "../escape").await;
        assert!(matches!(result, Err(ExtensionError::InvalidId(_))));
    }
}
