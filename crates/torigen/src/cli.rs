//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use torigen_core::types::Capability;
use torigen_extensions::SortKey;

/// Torigen - manga source extension manager
#[derive(Parser, Debug)]
#[command(name = "torigen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Data directory holding extensions/ and remote-extensions/
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory containing config.yaml
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Extension management
    #[command(subcommand, visible_alias = "ext")]
    Extension(ExtensionCommands),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Extension commands
#[derive(Subcommand, Debug)]
pub enum ExtensionCommands {
    /// List loaded extensions
    List(ExtensionListArgs),

    /// Rediscover all extensions and show what failed to load
    Reload(ExtensionReloadArgs),

    /// Show extension information
    Info(ExtensionInfoArgs),

    /// Install a remote extension from the catalog
    Install(ExtensionInstallArgs),

    /// Update remote extensions to the catalog version
    Update(ExtensionUpdateArgs),

    /// Uninstall a remote extension
    Remove(ExtensionRemoveArgs),

    /// Enable extensions
    Enable(ExtensionToggleArgs),

    /// Disable extensions
    Disable(ExtensionToggleArgs),

    /// Scaffold a new local extension
    Template(ExtensionTemplateArgs),

    /// Show the remote source catalog
    Catalog(ExtensionCatalogArgs),

    /// Check installed remote extensions for updates
    Check(ExtensionCheckArgs),
}

#[derive(Args, Debug)]
pub struct ExtensionListArgs {
    /// Show enabled extensions only
    #[arg(long)]
    pub enabled: bool,

    /// Filter by capability (homepage, search, view-more, include-tags, exclude-tags, pagination)
    #[arg(short, long)]
    pub capability: Option<Capability>,

    /// Filter by content language (providers declaring "multi" always match)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Sort key (name, version, author)
    #[arg(short, long, default_value = "name")]
    pub sort: SortKey,

    /// Reverse the sort order
    #[arg(long)]
    pub desc: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionReloadArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionInfoArgs {
    /// Extension id
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionInstallArgs {
    /// Catalog id of the extension
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ExtensionUpdateArgs {
    /// Extension id
    #[arg(required_unless_present = "all")]
    pub id: Option<String>,

    /// Update every remote extension with a newer catalog version
    #[arg(long, conflicts_with = "id")]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionRemoveArgs {
    /// Extension id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ExtensionToggleArgs {
    /// Extension ids
    #[arg(required_unless_present = "all")]
    pub ids: Vec<String>,

    /// Apply to every extension
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionTemplateArgs {
    /// Id for the new extension
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ExtensionCatalogArgs {
    /// Bypass the in-memory copy and fetch again
    #[arg(long)]
    pub refresh: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionCheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_filters_parse() {
        let cli = Cli::parse_from([
            "torigen",
            "extension",
            "list",
            "--capability",
            "search",
            "--sort",
            "version",
            "--desc",
        ]);
        match cli.command {
            Commands::Extension(ExtensionCommands::List(args)) => {
                assert_eq!(args.capability, Some(Capability::Search));
                assert_eq!(args.sort, SortKey::Version);
                assert!(args.desc);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_toggle_requires_ids_or_all() {
        assert!(Cli::try_parse_from(["torigen", "extension", "enable"]).is_err());
        assert!(Cli::try_parse_from(["torigen", "extension", "disable", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["torigen", "extension", "enable", "a", "--all"]).is_err());
    }

    #[test]
    fn test_global_data_dir() {
        let cli = Cli::parse_from(["torigen", "ext", "reload", "--data-dir", "/tmp/torigen"]);
        assert_eq!(cli.global.data_dir, Some(PathBuf::from("/tmp/torigen")));
    }
}
