//! Extension install command

use anyhow::{Context, Result};

use super::common::discovered;
use crate::cli::{ExtensionInstallArgs, GlobalArgs};
use crate::output;

/// Install a remote extension by catalog id
///
/// Discovery runs first so an id already taken by a local extension is
/// refused instead of shadowed.
pub(super) async fn run(args: ExtensionInstallArgs, global: &GlobalArgs) -> Result<()> {
    let (manager, _report) = discovered(global).await?;

    if let Some(existing) = manager.get(&args.id) {
        if existing.info.is_remote() {
            output::info(&format!(
                "{} {} is already installed; reinstalling",
                existing.info.id,
                existing.info.version.as_deref().unwrap_or("")
            ));
        }
    }

    let spinner = output::spinner(&format!("Installing {}...", args.id));
    let result = manager.install_from_catalog(&args.id).await;
    spinner.finish_and_clear();

    let loaded = result.with_context(|| format!("Failed to install '{}'", args.id))?;
    output::success(&format!(
        "Installed {} {}",
        loaded.info.name,
        loaded.info.version.as_deref().unwrap_or("")
    ));
    Ok(())
}
