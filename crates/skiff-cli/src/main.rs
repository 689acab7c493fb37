//! Skiff CLI - Snapshot backup daemon for Dropbox
//!
//! Usage:
//!   skiff run               Poll and mirror snapshots forever
//!   skiff once              Run a single backup cycle
//!   skiff check             Validate the Dropbox credential

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use skiff_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > config debug flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose || config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    // Token is redacted by Config's Debug impl
    tracing::debug!("Loaded config: {:?}", config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::cmd_run(config).await,
        Commands::Once => commands::cmd_once(config).await,
        Commands::Check => commands::cmd_check(config).await,
    }
}
