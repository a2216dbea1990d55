//! Extension management commands
//!
//! Implements extension management CLI commands:
//! - list: List loaded extensions with filtering and sorting
//! - reload: Rediscover extensions and report failures
//! - info: Show detailed extension information
//! - install: Install a remote extension from the catalog
//! - update: Update remote extensions
//! - remove: Uninstall a remote extension
//! - enable / disable: Toggle extensions
//! - template: Scaffold a local extension
//! - catalog: Show the remote source catalog
//! - check: Check for extension updates

mod catalog;
mod check;
mod common;
mod info;
mod install;
mod list;
mod reload;
mod remove;
mod template;
mod toggle;
mod update;

use anyhow::Result;

use crate::cli::{ExtensionCommands, GlobalArgs};

/// Main entry point for extension subcommands
pub async fn run(cmd: ExtensionCommands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        ExtensionCommands::List(args) => list::run(args, global).await,
        ExtensionCommands::Reload(args) => reload::run(args, global).await,
        ExtensionCommands::Info(args) => info::run(args, global).await,
        ExtensionCommands::Install(args) => install::run(args, global).await,
        ExtensionCommands::Update(args) => update::run(args, global).await,
        ExtensionCommands::Remove(args) => remove::run(args, global).await,
        ExtensionCommands::Enable(args) => toggle::run(args, true, global).await,
        ExtensionCommands::Disable(args) => toggle::run(args, false, global).await,
        ExtensionCommands::Template(args) => template::run(args, global).await,
        ExtensionCommands::Catalog(args) => catalog::run(args, global).await,
        ExtensionCommands::Check(args) => check::run(args, global).await,
    }
}
