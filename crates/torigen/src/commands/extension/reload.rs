//! Extension reload command

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

use super::common::discovered;
use crate::cli::{ExtensionReloadArgs, GlobalArgs};
use crate::output;

#[derive(Tabled, serde::Serialize)]
struct FailureRow {
    location: String,
    reason: String,
}

/// Run a full discovery pass and report every skipped extension
pub(super) async fn run(args: ExtensionReloadArgs, global: &GlobalArgs) -> Result<()> {
    let spinner = (!args.json).then(|| output::spinner("Discovering extensions..."));
    let (_manager, report) = discovered(global).await?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let failures: Vec<FailureRow> = report
        .failures
        .iter()
        .map(|failure| FailureRow {
            location: failure.location.display().to_string(),
            reason: failure.reason.clone(),
        })
        .collect();

    if args.json {
        let json = serde_json::json!({
            "loaded": report.loaded,
            "failures": failures,
            "warnings": report.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    output::success(&format!("Loaded {} extension(s)", report.loaded.len()));

    if !failures.is_empty() {
        output::warning(&format!("{} extension(s) skipped:", failures.len()));
        println!("{}", Table::new(&failures).with(Style::rounded()));
    }
    for warning in &report.warnings {
        output::warning(warning);
    }
    Ok(())
}
