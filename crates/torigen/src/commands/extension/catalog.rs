//! Extension catalog command

use anyhow::Result;
use owo_colors::OwoColorize;
use tabled::{settings::Style, Table, Tabled};
use torigen_extensions::CatalogOrigin;

use super::common::{manager, or_dash};
use crate::cli::{ExtensionCatalogArgs, GlobalArgs};
use crate::output;

#[derive(Tabled, serde::Serialize)]
struct CatalogRow {
    id: String,
    name: String,
    version: String,
    author: String,
    installed: String,
}

/// Show the remote source catalog, marking installed entries
pub(super) async fn run(args: ExtensionCatalogArgs, global: &GlobalArgs) -> Result<()> {
    let manager = manager(global)?;

    let spinner = (!args.json).then(|| output::spinner("Fetching catalog..."));
    let fetched = if args.refresh {
        manager.catalog().refresh().await
    } else {
        manager.catalog().fetch().await
    };
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let installed = manager.manifest().load().await?;
    let rows: Vec<CatalogRow> = fetched
        .list
        .sources
        .iter()
        .map(|source| CatalogRow {
            id: source.id.clone(),
            name: source.name.clone(),
            version: source.version.clone(),
            author: or_dash(Some(source.author.as_str())),
            installed: installed
                .get(&source.id)
                .and_then(|entry| entry.version.clone())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    if args.json {
        let json = serde_json::json!({
            "origin": fetched.origin.to_string(),
            "error": fetched.origin.error(),
            "version": fetched.list.version,
            "sources": rows,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    match &fetched.origin {
        CatalogOrigin::Network => {}
        CatalogOrigin::Cache { error } => {
            output::warning(&format!("Catalog unreachable ({}); showing cached copy", error));
        }
        CatalogOrigin::Empty { error } => {
            output::warning(&format!("Catalog unreachable ({}) and no cached copy", error));
        }
    }

    if rows.is_empty() {
        output::info("The catalog is empty");
        return Ok(());
    }

    println!("{}", Table::new(&rows).with(Style::rounded()));
    println!(
        "{}",
        format!(
            "catalog {} from {}",
            fetched.list.version,
            manager.catalog().url()
        )
        .dimmed()
    );
    Ok(())
}
