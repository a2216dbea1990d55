//! Extension template command

use anyhow::{Context, Result};

use super::common::manager;
use crate::cli::{ExtensionTemplateArgs, GlobalArgs};
use crate::output;

/// Scaffold a local extension crate under the extensions directory
pub(super) async fn run(args: ExtensionTemplateArgs, global: &GlobalArgs) -> Result<()> {
    let manager = manager(global)?;

    let files = manager
        .create_template(&args.id)
        .await
        .with_context(|| format!("Failed to create template '{}'", args.id))?;

    let dir = manager.paths().local_dir(&args.id);
    output::success(&format!("Created {}", dir.display()));
    for file in &files {
        println!("  {}", file.display());
    }

    output::header("Next steps");
    println!("  cd {}", dir.display());
    println!("  cargo build --release --target wasm32-unknown-unknown");
    println!("  # copy the built .wasm to index.wasm (see README.md)");
    println!("  torigen extension reload");
    Ok(())
}
