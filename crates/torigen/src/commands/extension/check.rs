//! Extension check command

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

use super::common::manager;
use crate::cli::{ExtensionCheckArgs, GlobalArgs};
use crate::output;

#[derive(Tabled, serde::Serialize)]
struct UpdateRow {
    id: String,
    name: String,
    installed: String,
    available: String,
}

/// Check installed remote extensions against the catalog
pub(super) async fn run(args: ExtensionCheckArgs, global: &GlobalArgs) -> Result<()> {
    let manager = manager(global)?;

    let spinner = (!args.json).then(|| output::spinner("Checking for updates..."));
    let updates = manager.check_updates().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let rows: Vec<UpdateRow> = updates?
        .into_iter()
        .map(|update| UpdateRow {
            id: update.id,
            name: update.name,
            installed: update.installed.unwrap_or_else(|| "-".to_string()),
            available: update.available,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::success("All remote extensions are up to date");
        return Ok(());
    }

    println!("{}", Table::new(&rows).with(Style::rounded()));
    output::info("Run `torigen extension update --all` to apply");
    Ok(())
}
