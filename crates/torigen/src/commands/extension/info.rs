//! Extension info command

use anyhow::{anyhow, Result};
use torigen_extensions::SourceProvider;

use super::common::{capability_list, discovered, or_dash, warn_on_failures, yes_no};
use crate::cli::{ExtensionInfoArgs, GlobalArgs};
use crate::output;

/// Show detailed information about an extension
///
/// Falls back to the catalog entry when the extension is not installed.
pub(super) async fn run(args: ExtensionInfoArgs, global: &GlobalArgs) -> Result<()> {
    let (manager, report) = discovered(global).await?;
    if !args.json {
        warn_on_failures(&report);
    }

    let Some(ext) = manager.get(&args.id) else {
        let remote = manager
            .catalog()
            .find(&args.id)
            .await
            .ok_or_else(|| anyhow!("Extension '{}' is not installed or in the catalog", args.id))?;

        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "installed": false,
                    "catalog": remote,
                }))?
            );
            return Ok(());
        }

        output::header(&remote.name);
        output::kv("Id", &remote.id);
        output::kv("Version", &remote.version);
        output::kv("Author", &or_dash(Some(remote.author.as_str())));
        output::kv("Description", &or_dash(Some(remote.description.as_str())));
        output::kv("Website", &or_dash(Some(remote.base_url.as_str())));
        if let Some(min) = &remote.min_app_version {
            output::kv("Requires", &format!("torigen >= {}", min));
        }
        output::info(&format!(
            "Not installed. Run `torigen extension install {}`",
            remote.id
        ));
        return Ok(());
    };

    let provider = ext.source.info();
    if args.json {
        let capabilities: Vec<String> = ext
            .source
            .capabilities()
            .enabled()
            .iter()
            .map(|c| c.to_string())
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "installed": true,
                "info": ext.info,
                "language": provider.language,
                "capabilities": capabilities,
                "directory": ext.directory_path,
            }))?
        );
        return Ok(());
    }

    output::header(&ext.info.name);
    output::kv("Id", &ext.info.id);
    output::kv("Origin", &ext.info.origin.to_string());
    output::kv("Version", &or_dash(ext.info.version.as_deref()));
    output::kv("Author", &or_dash(ext.info.author.as_deref()));
    output::kv("Description", &or_dash(ext.info.description.as_deref()));
    output::kv("Enabled", &yes_no(ext.info.enabled));
    output::kv("Website", &or_dash(Some(ext.info.base_url.as_str())));
    output::kv("Language", &or_dash(provider.language.as_deref()));
    output::kv("Capabilities", &capability_list(&ext));
    if let Some(dir) = &ext.directory_path {
        output::kv("Directory", &dir.display().to_string());
    }
    if let Some(url) = &ext.info.source_url {
        output::kv("Source", url);
    }
    if let Some(updated) = &ext.info.last_updated {
        output::kv("Updated", &updated.format("%Y-%m-%d %H:%M UTC").to_string());
    }
    Ok(())
}
