//! Shared helpers for extension subcommands

use anyhow::{Context, Result};
use tabled::Tabled;
use torigen_core::{ConfigLoader, RuntimeConfig};
use torigen_extensions::{DiscoveryReport, ExtensionManager, LoadedExtension, SourceProvider};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::output;

/// Load runtime configuration, applying command-line overrides last
pub(super) fn load_config(global: &GlobalArgs) -> Result<RuntimeConfig> {
    let loader = match &global.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new().context("Failed to locate config directory")?,
    };
    let mut config = loader
        .load_runtime_config()
        .context("Failed to load configuration")?;

    if let Some(data_dir) = &global.data_dir {
        config.data_dir = Some(data_dir.clone());
    }
    debug!(
        "Using catalog {} with data directory {:?}",
        config.catalog.url, config.data_dir
    );
    Ok(config)
}

/// Build a manager without running discovery
pub(super) fn manager(global: &GlobalArgs) -> Result<ExtensionManager> {
    let config = load_config(global)?;
    ExtensionManager::from_config(&config).context("Failed to initialize extension manager")
}

/// Build a manager and run discovery, warning about skipped extensions
pub(super) async fn discovered(global: &GlobalArgs) -> Result<(ExtensionManager, DiscoveryReport)> {
    let manager = manager(global)?;
    let report = manager
        .load_all()
        .await
        .context("Failed to discover extensions")?;
    Ok((manager, report))
}

/// Summarize discovery problems on stderr
pub(super) fn warn_on_failures(report: &DiscoveryReport) {
    for failure in &report.failures {
        debug!("Skipped {}: {}", failure.location.display(), failure.reason);
    }
    if !report.failures.is_empty() {
        output::warning(&format!(
            "{} extension(s) failed to load; run `torigen extension reload` for details",
            report.failures.len()
        ));
    }
    for warning in &report.warnings {
        output::warning(warning);
    }
}

/// One loaded extension as a table row
#[derive(Tabled, serde::Serialize)]
pub(super) struct ExtensionRow {
    pub id: String,
    pub name: String,
    pub version: String,
    pub origin: String,
    pub enabled: String,
    pub language: String,
    pub capabilities: String,
}

impl From<&LoadedExtension> for ExtensionRow {
    fn from(ext: &LoadedExtension) -> Self {
        Self {
            id: ext.info.id.clone(),
            name: ext.info.name.clone(),
            version: or_dash(ext.info.version.as_deref()),
            origin: ext.info.origin.to_string(),
            enabled: yes_no(ext.info.enabled),
            language: or_dash(ext.source.info().language.as_deref()),
            capabilities: capability_list(ext),
        }
    }
}

pub(super) fn capability_list(ext: &LoadedExtension) -> String {
    let enabled = ext.source.capabilities().enabled();
    if enabled.is_empty() {
        return "-".to_string();
    }
    enabled
        .iter()
        .map(|capability| capability.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

pub(super) fn yes_no(value: bool) -> String {
    String::from(if value { "yes" } else { "no" })
}
