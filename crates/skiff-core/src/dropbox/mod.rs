//! Dropbox storage abstraction
//!
//! # Architecture
//!
//! - `DropboxStore` trait: the operations the backup engine needs
//! - `HttpDropboxStore`: reqwest client speaking the real Dropbox API
//! - `MockStore`: recording mock for tests, no network
//!
//! Not-found is a value, not an error: `get_metadata` returns
//! `Ok(None)` when no object exists at the path, so callers branch on
//! kind instead of catching broad errors.

mod http;
mod mock;

pub use http::HttpDropboxStore;
pub use mock::{MockStore, StoreCall};

use async_trait::async_trait;

use crate::error::Result;

/// Metadata of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Dropbox block content hash, lowercase hex
    pub content_hash: String,
    /// Object size in bytes
    pub size: u64,
}

/// Operations the backup engine needs from Dropbox
///
/// Implementations must be Send + Sync; the engine drives them strictly
/// sequentially from a single task.
#[async_trait]
pub trait DropboxStore: Send + Sync {
    /// Validate the credential. Called once at startup; failure is fatal.
    async fn current_account(&self) -> Result<()>;

    /// Fetch metadata for a path, or `None` if nothing exists there
    async fn get_metadata(&self, path: &str) -> Result<Option<FileMetadata>>;

    /// Upload a whole object in one call
    async fn upload(&self, data: Vec<u8>, path: &str) -> Result<()>;

    /// Open an upload session with the first chunk; returns the session id
    async fn upload_session_start(&self, data: Vec<u8>) -> Result<String>;

    /// Append one chunk at the given offset
    async fn upload_session_append(
        &self,
        data: Vec<u8>,
        session_id: &str,
        offset: u64,
    ) -> Result<()>;

    /// Send the final chunk, close the session and commit to `path`
    async fn upload_session_finish(
        &self,
        data: Vec<u8>,
        session_id: &str,
        offset: u64,
        path: &str,
    ) -> Result<()>;

    /// Delete the object at a path
    async fn delete(&self, path: &str) -> Result<()>;
}
