//! Extension enable/disable commands

use anyhow::{bail, Result};

use super::common::discovered;
use crate::cli::{ExtensionToggleArgs, GlobalArgs};
use crate::output;

pub(super) async fn run(
    args: ExtensionToggleArgs,
    enabled: bool,
    global: &GlobalArgs,
) -> Result<()> {
    let (manager, _report) = discovered(global).await?;
    let verb = if enabled { "Enabled" } else { "Disabled" };

    let updated = if args.all {
        manager.set_all_enabled(enabled).await?
    } else {
        manager.set_enabled_many(&args.ids, enabled).await?
    };

    for id in args.ids.iter().filter(|id| !updated.contains(id)) {
        output::warning(&format!("Extension '{}' is not installed", id));
    }

    if updated.is_empty() {
        if args.all {
            output::info("No extensions installed");
            return Ok(());
        }
        bail!("No matching extensions");
    }

    output::success(&format!("{} {}", verb, updated.join(", ")));
    Ok(())
}
