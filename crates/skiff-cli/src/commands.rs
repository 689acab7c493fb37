//! CLI command implementations
//!
//! - `run` - the long-lived polling loop (what the add-on container runs)
//! - `once` - a single backup cycle, for cron-style setups and debugging
//! - `check` - credential validation without touching any snapshot

use anyhow::Result;
use tracing::info;

use skiff_core::{BackupDriver, Config, HttpDropboxStore, HttpSupervisor, TokioSleeper};

fn build_driver(config: Config) -> Result<BackupDriver> {
    let store = HttpDropboxStore::new(&config.access_token);
    let supervisor = HttpSupervisor::from_env()?;
    Ok(BackupDriver::new(
        config,
        Box::new(store),
        Box::new(supervisor),
        Box::new(TokioSleeper),
    ))
}

/// Poll and mirror snapshots until the process is stopped
pub async fn cmd_run(config: Config) -> Result<()> {
    let driver = build_driver(config)?;
    driver.run().await?;
    Ok(())
}

/// Run one backup cycle and exit
pub async fn cmd_once(config: Config) -> Result<()> {
    let driver = build_driver(config)?;
    driver.check_account().await?;
    driver.run_cycle().await?;
    Ok(())
}

/// Validate the Dropbox credential
pub async fn cmd_check(config: Config) -> Result<()> {
    let driver = build_driver(config)?;
    driver.check_account().await?;
    info!("Access token OK");
    Ok(())
}
