//! Snapshot model and path derivation
//!
//! Snapshots are created by the supervisor independently of this daemon;
//! we only ever read them and, once expired, ask the supervisor to remove
//! them. Local and remote copies share the `<slug>.tar` naming scheme.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One backup archive known to the supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable unique identifier, used in paths and deletion requests
    pub slug: String,
    /// Human-readable label, display only
    pub name: String,
    /// Creation timestamp; defines retention ordering
    pub date: DateTime<Utc>,
}

impl Snapshot {
    /// Path of the snapshot archive on the local filesystem
    pub fn local_path(&self, backup_dir: &Path) -> PathBuf {
        backup_dir.join(format!("{}.tar", self.slug))
    }

    /// Destination path in Dropbox
    pub fn remote_path(&self, dropbox_dir: &str) -> String {
        format!("{}/{}.tar", dropbox_dir.trim_end_matches('/'), self.slug)
    }
}

/// Re-establish newest-first order
///
/// Listings from the supervisor are treated as unordered input; every
/// consumer sorts for itself.
pub fn sort_newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Format a byte count for log lines, e.g. `1.5 GB`
pub fn bytes_to_human(nbytes: u64) -> String {
    const SUFFIXES: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let mut value = nbytes as f64;
    let mut idx = 0;
    while value >= 1024.0 && idx < SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SUFFIXES[idx])
}
