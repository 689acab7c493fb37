//! Mock store for testing
//!
//! Records every call the engine makes and tracks uploaded objects in
//! memory, reporting the same content hashes the real service would.
//! Session offsets are verified, so upload bookkeeping bugs surface as
//! test failures instead of silent corruption.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::hash;

use super::{DropboxStore, FileMetadata};

/// One recorded call against the mock store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    AccountCheck,
    GetMetadata {
        path: String,
    },
    Upload {
        path: String,
        bytes: usize,
    },
    SessionStart {
        bytes: usize,
    },
    SessionAppend {
        session_id: String,
        offset: u64,
        bytes: usize,
    },
    SessionFinish {
        session_id: String,
        offset: u64,
        path: String,
        bytes: usize,
    },
    Delete {
        path: String,
    },
}

#[derive(Default)]
struct MockState {
    files: HashMap<String, FileMetadata>,
    sessions: HashMap<String, Vec<u8>>,
    calls: Vec<StoreCall>,
    fail_uploads: u32,
    fail_deletes: u32,
    reject_account: bool,
    next_session: u64,
}

/// In-memory Dropbox store for tests
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an object whose hash matches `content`
    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.files.insert(
                path.to_string(),
                FileMetadata {
                    content_hash: hash::content_hash_bytes(content, hash::BLOCK_SIZE),
                    size: content.len() as u64,
                },
            );
        }
        self
    }

    /// Pre-populate an object with an arbitrary (possibly stale) hash
    pub fn with_file_hash(self, path: &str, content_hash: &str, size: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.files.insert(
                path.to_string(),
                FileMetadata {
                    content_hash: content_hash.to_string(),
                    size,
                },
            );
        }
        self
    }

    /// Fail the next `n` upload-family calls (upload/start/append/finish)
    pub fn fail_next_uploads(&self, n: u32) {
        self.state.lock().unwrap().fail_uploads = n;
    }

    /// Fail the next `n` delete calls
    pub fn fail_next_deletes(&self, n: u32) {
        self.state.lock().unwrap().fail_deletes = n;
    }

    /// Make `current_account` fail with an auth error
    pub fn reject_account(&self) {
        self.state.lock().unwrap().reject_account = true;
    }

    /// Everything the engine has called so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Whether an object currently exists at `path`
    pub fn contains(&self, path: &str) -> bool {
        self.state.lock().unwrap().files.contains_key(path)
    }

    /// Metadata of the object at `path`, if any
    pub fn metadata_of(&self, path: &str) -> Option<FileMetadata> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    fn take_upload_failure(state: &mut MockState) -> bool {
        if state.fail_uploads > 0 {
            state.fail_uploads -= 1;
            return true;
        }
        false
    }
}

#[async_trait]
impl DropboxStore for MockStore {
    async fn current_account(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::AccountCheck);
        if state.reject_account {
            return Err(Error::Auth("invalid access token".into()));
        }
        Ok(())
    }

    async fn get_metadata(&self, path: &str) -> Result<Option<FileMetadata>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::GetMetadata {
            path: path.to_string(),
        });
        Ok(state.files.get(path).cloned())
    }

    async fn upload(&self, data: Vec<u8>, path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Upload {
            path: path.to_string(),
            bytes: data.len(),
        });
        if Self::take_upload_failure(&mut state) {
            return Err(Error::Upload("injected upload failure".into()));
        }
        state.files.insert(
            path.to_string(),
            FileMetadata {
                content_hash: hash::content_hash_bytes(&data, hash::BLOCK_SIZE),
                size: data.len() as u64,
            },
        );
        Ok(())
    }

    async fn upload_session_start(&self, data: Vec<u8>) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::SessionStart { bytes: data.len() });
        if Self::take_upload_failure(&mut state) {
            return Err(Error::Upload("injected upload failure".into()));
        }
        state.next_session += 1;
        let session_id = format!("mock-session-{}", state.next_session);
        state.sessions.insert(session_id.clone(), data);
        Ok(session_id)
    }

    async fn upload_session_append(
        &self,
        data: Vec<u8>,
        session_id: &str,
        offset: u64,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::SessionAppend {
            session_id: session_id.to_string(),
            offset,
            bytes: data.len(),
        });
        if Self::take_upload_failure(&mut state) {
            return Err(Error::Upload("injected upload failure".into()));
        }
        let buffer = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::Upload(format!("unknown session {}", session_id)))?;
        if buffer.len() as u64 != offset {
            return Err(Error::Upload(format!(
                "offset mismatch: session has {} bytes, cursor says {}",
                buffer.len(),
                offset
            )));
        }
        buffer.extend_from_slice(&data);
        Ok(())
    }

    async fn upload_session_finish(
        &self,
        data: Vec<u8>,
        session_id: &str,
        offset: u64,
        path: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::SessionFinish {
            session_id: session_id.to_string(),
            offset,
            path: path.to_string(),
            bytes: data.len(),
        });
        if Self::take_upload_failure(&mut state) {
            return Err(Error::Upload("injected upload failure".into()));
        }
        let mut buffer = state
            .sessions
            .remove(session_id)
            .ok_or_else(|| Error::Upload(format!("unknown session {}", session_id)))?;
        if buffer.len() as u64 != offset {
            return Err(Error::Upload(format!(
                "offset mismatch: session has {} bytes, cursor says {}",
                buffer.len(),
                offset
            )));
        }
        buffer.extend_from_slice(&data);
        state.files.insert(
            path.to_string(),
            FileMetadata {
                content_hash: hash::content_hash_bytes(&buffer, hash::BLOCK_SIZE),
                size: buffer.len() as u64,
            },
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Delete {
            path: path.to_string(),
        });
        if state.fail_deletes > 0 {
            state.fail_deletes -= 1;
            return Err(Error::Dropbox("injected delete failure".into()));
        }
        state.files.remove(path);
        Ok(())
    }
}
