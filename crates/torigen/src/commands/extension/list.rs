//! Extension list command

use anyhow::Result;
use tabled::{settings::Style, Table};
use torigen_extensions::{query, SortOrder};

use super::common::{discovered, warn_on_failures, ExtensionRow};
use crate::cli::{ExtensionListArgs, GlobalArgs};
use crate::output;

/// List loaded extensions
///
/// Supports:
/// - All loaded: `torigen extension list`
/// - Enabled only: `torigen extension list --enabled`
/// - By capability: `torigen extension list --capability search`
/// - By language: `torigen extension list --language en`
/// - Sorted: `torigen extension list --sort version --desc`
/// - JSON output: `torigen extension list --json`
pub(super) async fn run(args: ExtensionListArgs, global: &GlobalArgs) -> Result<()> {
    let (manager, report) = discovered(global).await?;
    if !args.json {
        warn_on_failures(&report);
    }

    let order = if args.desc {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    let mut extensions = if args.enabled {
        manager.get_all_enabled()
    } else {
        manager.get_all()
    };
    if let Some(capability) = args.capability {
        extensions = query::by_capability(extensions, capability);
    }
    if let Some(language) = &args.language {
        extensions = query::by_language(extensions, language);
    }
    query::sort(&mut extensions, args.sort, order);

    let rows: Vec<ExtensionRow> = extensions.iter().map(ExtensionRow::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::info("No extensions match");
        return Ok(());
    }

    println!("{}", Table::new(&rows).with(Style::rounded()));
    output::info(&format!("{} extension(s)", rows.len()));
    Ok(())
}
