mod app;
mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::TasklistApp;
use crate::cli::CliArgs;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the rendered list
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_tracing(cli_args.verbose);

    info!("Starting tasklist");

    let config = config::from_cli_and_file(&cli_args)?;
    let app = TasklistApp::new(&config)?;

    if let Err(e) = app.run(cli_args.command).await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("tasklist shut down cleanly");
    Ok(())
}
