//! Retention enforcement
//!
//! Once more than `keep` snapshots exist, the oldest ones past the limit
//! are expired: each gets a supervisor removal request (which drops the
//! local archive) and a Dropbox delete. Pruning is destructive, so it is
//! strictly opt-in — an unset or zero `keep` disables it.
//!
//! The two deletions are independent calls with no compensating
//! transaction. A failure propagates to the cycle-level handler; the next
//! cycle re-derives everything from a fresh listing, so both sides are
//! safe to retry.

use tracing::{info, warn};

use crate::dropbox::DropboxStore;
use crate::error::Result;
use crate::snapshot::{sort_newest_first, Snapshot};
use crate::supervisor::SupervisorApi;

/// Delete every snapshot past the `keep` newest, on both ends
pub async fn limit_snapshots(
    store: &dyn DropboxStore,
    supervisor: &dyn SupervisorApi,
    dropbox_dir: &str,
    keep: Option<usize>,
    snapshots: &[Snapshot],
) -> Result<()> {
    let keep = match keep {
        Some(k) if k > 0 => k,
        _ => {
            warn!("keep not set. We won't remove old snapshots");
            return Ok(());
        }
    };

    if snapshots.len() <= keep {
        info!("Not reached the maximum number of snapshots");
        return Ok(());
    }

    info!("Limiting snapshots to the {} most recent", keep);

    // Sorted independently of the upload phase's view; this phase's order
    // is authoritative for this phase only.
    let mut ordered = snapshots.to_vec();
    sort_newest_first(&mut ordered);
    let expired = &ordered[keep..];

    info!("Deleting {} snapshots", expired.len());

    for snapshot in expired {
        info!("Deleting {} (slug: {})", snapshot.name, snapshot.slug);
        supervisor.remove_snapshot(&snapshot.slug).await?;
        store.delete(&snapshot.remote_path(dropbox_dir)).await?;
    }

    Ok(())
}
