//! Snapshot transfer orchestration
//!
//! Decides, per snapshot, whether the remote copy is already current:
//!
//! | Remote exists? | Hash matches? | Action                        |
//! |----------------|---------------|-------------------------------|
//! | no             | —             | upload                        |
//! | yes            | yes           | skip                          |
//! | yes            | no            | delete remote, then upload    |
//!
//! Snapshots are processed one at a time, in listing order. A failure on
//! one snapshot is logged and never aborts the batch.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::dropbox::DropboxStore;
use crate::error::Result;
use crate::hash;
use crate::snapshot::{bytes_to_human, Snapshot};
use crate::upload;

/// Uploads a batch of snapshots to a Dropbox directory
pub struct SnapshotTransfer<'a> {
    store: &'a dyn DropboxStore,
    backup_dir: &'a Path,
    dropbox_dir: &'a str,
}

impl<'a> SnapshotTransfer<'a> {
    pub fn new(store: &'a dyn DropboxStore, backup_dir: &'a Path, dropbox_dir: &'a str) -> Self {
        Self {
            store,
            backup_dir,
            dropbox_dir,
        }
    }

    /// Upload each snapshot in listing order
    ///
    /// The caller hands the list newest-first. With a retention limit set,
    /// only the first `keep` entries are considered at all; snapshots past
    /// the limit would be pruned right after uploading.
    pub async fn backup(&self, snapshots: &[Snapshot], keep: Option<usize>) {
        info!("Backing up {} snapshots", snapshots.len());
        info!("Backing up to Dropbox directory: {}", self.dropbox_dir);

        if snapshots.is_empty() {
            warn!("No snapshots found to backup");
            return;
        }

        let snapshots = match keep {
            Some(limit) if snapshots.len() > limit => {
                info!("Only backing up the first {} snapshots", limit);
                &snapshots[..limit]
            }
            _ => snapshots,
        };

        for (i, snapshot) in snapshots.iter().enumerate() {
            info!("Snapshot: {} ({}/{})", snapshot.name, i + 1, snapshots.len());
            self.process(snapshot).await;
        }
    }

    /// Back up one snapshot; logs and swallows every failure
    pub async fn process(&self, snapshot: &Snapshot) {
        let local = snapshot.local_path(self.backup_dir);
        let dest = snapshot.remote_path(self.dropbox_dir);

        info!("Slug: {}", snapshot.slug);
        info!("Created: {}", snapshot.date);
        match std::fs::metadata(&local) {
            Ok(meta) => info!("Size: {}", bytes_to_human(meta.len())),
            Err(e) => {
                error!("Cannot read local snapshot {}: {}", local.display(), e);
                return;
            }
        }
        info!("Uploading to: {}", dest);

        match self.remote_matches(&local, &dest).await {
            Ok(true) => {
                info!("Already found in Dropbox with the same hash");
            }
            Ok(false) => {
                if let Err(e) = upload::upload_file(self.store, &local, &dest).await {
                    error!("Upload failed: {}", e);
                }
            }
            Err(e) => {
                error!("Upload failed: {}", e);
            }
        }
    }

    /// Whether the remote copy already matches the local file byte for byte
    ///
    /// A mismatched remote copy is deleted here so the subsequent upload
    /// can never leave a stale object behind.
    async fn remote_matches(&self, local: &Path, dest: &str) -> Result<bool> {
        let metadata = match self.store.get_metadata(dest).await? {
            Some(metadata) => metadata,
            None => {
                info!("No existing snapshot in Dropbox with this name");
                return Ok(false);
            }
        };

        let local_hash = match hash::content_hash(local) {
            Ok(h) => h,
            Err(e) => {
                warn!("Could not hash local snapshot, re-uploading: {}", e);
                return Ok(false);
            }
        };

        debug!("Dropbox hash: {}", metadata.content_hash);
        debug!("Local hash: {}", local_hash);
        if local_hash == metadata.content_hash {
            return Ok(true);
        }

        warn!(
            "The snapshot conflicts with a file name in Dropbox, the contents are different. \
             The Dropbox file will be deleted and replaced. Local hash: {}, Dropbox hash: {}",
            local_hash, metadata.content_hash
        );
        self.store.delete(dest).await?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropbox::{MockStore, StoreCall};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn snapshot(slug: &str) -> Snapshot {
        Snapshot {
            slug: slug.to_string(),
            name: format!("Snapshot {}", slug),
            date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn write_local(dir: &TempDir, slug: &str, content: &[u8]) {
        fs::write(dir.path().join(format!("{}.tar", slug)), content).unwrap();
    }

    fn upload_calls(calls: &[StoreCall]) -> usize {
        calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    StoreCall::Upload { .. } | StoreCall::SessionFinish { .. }
                )
            })
            .count()
    }

    fn delete_calls(calls: &[StoreCall]) -> usize {
        calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Delete { .. }))
            .count()
    }

    #[tokio::test]
    async fn test_matching_hash_skips_upload() {
        let dir = TempDir::new().unwrap();
        write_local(&dir, "abc", b"archive bytes");
        let store = MockStore::new().with_file("/snapshots/abc.tar", b"archive bytes");
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer.process(&snapshot("abc")).await;

        let calls = store.calls();
        assert_eq!(upload_calls(&calls), 0);
        assert_eq!(delete_calls(&calls), 0);
    }

    #[tokio::test]
    async fn test_missing_remote_uploads() {
        let dir = TempDir::new().unwrap();
        write_local(&dir, "abc", b"archive bytes");
        let store = MockStore::new();
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer.process(&snapshot("abc")).await;

        let calls = store.calls();
        assert_eq!(upload_calls(&calls), 1);
        assert_eq!(delete_calls(&calls), 0);
        assert!(store.contains("/snapshots/abc.tar"));
    }

    #[tokio::test]
    async fn test_mismatched_hash_deletes_then_uploads() {
        let dir = TempDir::new().unwrap();
        write_local(&dir, "abc", b"new contents");
        let store = MockStore::new().with_file_hash("/snapshots/abc.tar", "stale", 12);
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer.process(&snapshot("abc")).await;

        let calls = store.calls();
        assert_eq!(delete_calls(&calls), 1);
        assert_eq!(upload_calls(&calls), 1);
        // Delete happens before the replacement upload
        let delete_idx = calls
            .iter()
            .position(|c| matches!(c, StoreCall::Delete { .. }))
            .unwrap();
        let upload_idx = calls
            .iter()
            .position(|c| matches!(c, StoreCall::Upload { .. }))
            .unwrap();
        assert!(delete_idx < upload_idx);
    }

    #[tokio::test]
    async fn test_failed_delete_skips_upload() {
        let dir = TempDir::new().unwrap();
        write_local(&dir, "abc", b"new contents");
        let store = MockStore::new().with_file_hash("/snapshots/abc.tar", "stale", 12);
        store.fail_next_deletes(1);
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer.process(&snapshot("abc")).await;

        assert_eq!(upload_calls(&store.calls()), 0);
    }

    #[tokio::test]
    async fn test_missing_local_file_makes_no_remote_calls() {
        let dir = TempDir::new().unwrap();
        let store = MockStore::new();
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer.process(&snapshot("ghost")).await;

        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_does_not_panic() {
        let dir = TempDir::new().unwrap();
        write_local(&dir, "abc", b"archive bytes");
        let store = MockStore::new();
        store.fail_next_uploads(4);
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer.process(&snapshot("abc")).await;

        assert!(!store.contains("/snapshots/abc.tar"));
    }

    #[tokio::test]
    async fn test_backup_empty_list() {
        let dir = TempDir::new().unwrap();
        let store = MockStore::new();
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer.backup(&[], Some(3)).await;

        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_backup_only_first_keep_snapshots() {
        let dir = TempDir::new().unwrap();
        for slug in ["one", "two", "three"] {
            write_local(&dir, slug, b"bytes");
        }
        let store = MockStore::new();
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        let snapshots = vec![snapshot("one"), snapshot("two"), snapshot("three")];
        transfer.backup(&snapshots, Some(2)).await;

        assert!(store.contains("/snapshots/one.tar"));
        assert!(store.contains("/snapshots/two.tar"));
        assert!(!store.contains("/snapshots/three.tar"));
    }

    #[tokio::test]
    async fn test_backup_processes_in_listing_order() {
        let dir = TempDir::new().unwrap();
        for slug in ["first", "second"] {
            write_local(&dir, slug, b"bytes");
        }
        let store = MockStore::new();
        let transfer = SnapshotTransfer::new(&store, dir.path(), "/snapshots");

        transfer
            .backup(&[snapshot("first"), snapshot("second")], None)
            .await;

        let metadata_paths: Vec<String> = store
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::GetMetadata { path } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(
            metadata_paths,
            vec!["/snapshots/first.tar", "/snapshots/second.tar"]
        );
    }
}
