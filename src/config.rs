use anyhow::Result;
use tasklist_app::adapters::persistence::FileConfigStore;
use tasklist_core::ports::{AppConfig, ConfigStore};
use tracing::debug;

use crate::cli::CliArgs;

/// Load the config file named on the command line, or the default one, and
/// apply the command line overrides on top.
pub fn from_cli_and_file(cli_args: &CliArgs) -> Result<AppConfig> {
    let store = match &cli_args.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new()?,
    };
    debug!("Using config file {}", store.path().display());

    Ok(apply_overrides(store.load()?, cli_args))
}

/// CLI args override config file
pub fn apply_overrides(mut config: AppConfig, cli_args: &CliArgs) -> AppConfig {
    if let Some(base_url) = &cli_args.base_url {
        config.server.base_url = base_url.clone();
    }
    config
}
