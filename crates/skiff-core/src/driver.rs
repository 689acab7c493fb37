//! Backup cycle driver
//!
//! Owns the outer polling loop: validate the credential once, then list,
//! upload, prune, sleep, forever. A failed cycle is logged and abandoned;
//! the process itself only exits on a startup auth failure or when the
//! injected sleeper signals shutdown.
//!
//! The store, supervisor and sleeper are injected so tests can run whole
//! cycles against mocks without real I/O or real waiting.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::Config;
use crate::dropbox::DropboxStore;
use crate::error::Result;
use crate::retention;
use crate::snapshot::sort_newest_first;
use crate::supervisor::SupervisorApi;
use crate::transfer::SnapshotTransfer;

/// Pause between cycles
///
/// Injectable so tests can simulate elapsed cycles instantly and signal
/// shutdown deterministically.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleep for `duration`; return true to stop the loop
    async fn sleep(&self, duration: Duration) -> bool;
}

/// Production sleeper backed by the tokio timer; never signals shutdown
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::time::sleep(duration).await;
        false
    }
}

/// The long-lived polling loop
pub struct BackupDriver {
    config: Config,
    store: Box<dyn DropboxStore>,
    supervisor: Box<dyn SupervisorApi>,
    sleeper: Box<dyn Sleeper>,
}

impl BackupDriver {
    pub fn new(
        config: Config,
        store: Box<dyn DropboxStore>,
        supervisor: Box<dyn SupervisorApi>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            config,
            store,
            supervisor,
            sleeper,
        }
    }

    /// Validate the credential with a real API call
    ///
    /// Failure here is fatal to the whole process; nothing is uploaded
    /// with a token that cannot even identify its account.
    pub async fn check_account(&self) -> Result<()> {
        if let Err(e) = self.store.current_account().await {
            if e.is_auth() {
                error!("Invalid access token");
            } else {
                error!("Account check failed: {}", e);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Check the account, then cycle until the sleeper signals shutdown
    pub async fn run(&self) -> Result<()> {
        self.check_account().await?;

        loop {
            if let Err(e) = self.run_cycle().await {
                error!("Unhandled error during backup cycle: {}", e);
            }

            let mins = self.config.mins_between_backups;
            info!("Sleeping for {} minutes", mins);
            if self.sleeper.sleep(Duration::from_secs(mins * 60)).await {
                info!("Shutdown requested, stopping");
                return Ok(());
            }
        }
    }

    /// One full list → upload → prune pass
    pub async fn run_cycle(&self) -> Result<()> {
        info!("Starting snapshot backup");
        let mut snapshots = self.supervisor.list_snapshots().await?;
        sort_newest_first(&mut snapshots);

        let transfer = SnapshotTransfer::new(
            self.store.as_ref(),
            &self.config.backup_dir,
            &self.config.dropbox_dir,
        );
        transfer.backup(&snapshots, self.config.keep_limit()).await;
        info!("Uploads complete");

        retention::limit_snapshots(
            self.store.as_ref(),
            self.supervisor.as_ref(),
            &self.config.dropbox_dir,
            self.config.keep_limit(),
            &snapshots,
        )
        .await?;
        info!("Snapshot cleanup complete");
        Ok(())
    }
}
