//! Extension remove command

use anyhow::{Context, Result};

use super::common::manager;
use crate::cli::{ExtensionRemoveArgs, GlobalArgs};
use crate::output;

/// Uninstall a remote extension
///
/// Local extensions are removed by deleting their directory.
pub(super) async fn run(args: ExtensionRemoveArgs, global: &GlobalArgs) -> Result<()> {
    let manager = manager(global)?;

    let outcome = manager
        .uninstall(&args.id)
        .await
        .with_context(|| format!("Failed to remove '{}'", args.id))?;

    if let Some(warning) = &outcome.cleanup_warning {
        output::warning(warning);
    }
    output::success(&format!("Removed {}", outcome.info.name));
    Ok(())
}
