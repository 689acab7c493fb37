//! Skiff Core Library
//!
//! Shared functionality for the Skiff snapshot backup daemon:
//! - Add-on configuration loading and validation
//! - Supervisor API client (snapshot listing and removal)
//! - Dropbox API client with a pluggable store trait
//! - Dropbox block content hashing for upload skipping
//! - Chunked uploader with session-based large-file transfer
//! - Transfer orchestration and retention enforcement
//! - The outer polling cycle driver

pub mod config;
pub mod driver;
pub mod dropbox;
pub mod error;
pub mod hash;
pub mod retention;
pub mod snapshot;
pub mod supervisor;
pub mod transfer;
pub mod upload;

pub use config::{Config, DEFAULT_CONFIG_PATH};
pub use driver::{BackupDriver, Sleeper, TokioSleeper};
pub use dropbox::{DropboxStore, FileMetadata, HttpDropboxStore, MockStore, StoreCall};
pub use error::{Error, Result};
pub use snapshot::Snapshot;
pub use supervisor::{HttpSupervisor, MockSupervisor, SupervisorApi};
pub use transfer::SnapshotTransfer;
