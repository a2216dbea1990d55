//! Extension update command

use anyhow::{Context, Result};

use super::common::discovered;
use crate::cli::{ExtensionUpdateArgs, GlobalArgs};
use crate::output;

/// Update one remote extension, or every one with a newer catalog version
pub(super) async fn run(args: ExtensionUpdateArgs, global: &GlobalArgs) -> Result<()> {
    let (manager, _report) = discovered(global).await?;

    let ids: Vec<String> = if args.all {
        let spinner = output::spinner("Checking for updates...");
        let updates = manager.check_updates().await;
        spinner.finish_and_clear();
        updates?.into_iter().map(|update| update.id).collect()
    } else {
        args.id.into_iter().collect()
    };

    if ids.is_empty() {
        output::success("All remote extensions are up to date");
        return Ok(());
    }

    let mut failed = 0usize;
    for id in &ids {
        let before = manager.get(id).and_then(|ext| ext.info.version);
        let spinner = output::spinner(&format!("Updating {}...", id));
        let result = manager.update(id).await;
        spinner.finish_and_clear();

        match result {
            Ok(loaded) if loaded.info.version == before => {
                output::info(&format!("{} is already up to date", id));
            }
            Ok(loaded) => output::success(&format!(
                "Updated {} {} -> {}",
                id,
                before.as_deref().unwrap_or("?"),
                loaded.info.version.as_deref().unwrap_or("?")
            )),
            Err(e) if ids.len() == 1 => {
                return Err(e).with_context(|| format!("Failed to update '{}'", id));
            }
            Err(e) => {
                failed += 1;
                output::error(&format!("Failed to update {}: {}", id, e));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} update(s) failed", failed, ids.len());
    }
    Ok(())
}
