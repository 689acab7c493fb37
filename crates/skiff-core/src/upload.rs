//! Chunked uploader
//!
//! Files at most one chunk long go up in a single `upload` call. Anything
//! larger is streamed through an upload session: the first chunk opens the
//! session, middle chunks are appended at an explicit byte offset, and the
//! final chunk closes the session and commits the object to its
//! destination path.
//!
//! The whole attempt is wrapped in a bounded retry. A failed attempt never
//! resumes its session; the retry starts over from byte 0 and the orphaned
//! session expires server-side.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::dropbox::DropboxStore;
use crate::error::Result;

/// Transfer unit for upload sessions, matching the content-hash block size
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Total attempts before an upload error propagates
const MAX_ATTEMPTS: u32 = 4;

/// Upload a local file to `dest`, retrying failed attempts before giving up
pub async fn upload_file(store: &dyn DropboxStore, path: &Path, dest: &str) -> Result<()> {
    upload_file_with_chunk_size(store, path, dest, CHUNK_SIZE).await
}

/// Upload with an explicit chunk size
///
/// Production uses [`CHUNK_SIZE`]; smaller sizes keep tests fast.
pub async fn upload_file_with_chunk_size(
    store: &dyn DropboxStore,
    path: &Path,
    dest: &str,
    chunk_size: usize,
) -> Result<()> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match upload_once(store, path, dest, chunk_size).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "Upload attempt {}/{} failed, restarting from byte 0: {}",
                    attempt, MAX_ATTEMPTS, e
                );
            }
            Err(e) => return Err(e),
        }
    }
}

async fn upload_once(
    store: &dyn DropboxStore,
    path: &Path,
    dest: &str,
    chunk_size: usize,
) -> Result<()> {
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    if file_size <= chunk_size as u64 {
        let mut data = Vec::with_capacity(file_size as usize);
        file.read_to_end(&mut data)?;
        return store.upload(data, dest).await;
    }

    let first = read_chunk(&mut file, chunk_size)?;
    let mut offset = first.len() as u64;
    let session_id = store.upload_session_start(first).await?;

    let mut progress = Progress::new(file_size);
    while offset < file_size {
        progress.log(offset);

        let remaining = file_size - offset;
        if remaining <= chunk_size as u64 {
            let last = read_chunk(&mut file, remaining as usize)?;
            store
                .upload_session_finish(last, &session_id, offset, dest)
                .await?;
            offset = file_size;
        } else {
            let chunk = read_chunk(&mut file, chunk_size)?;
            let sent = chunk.len() as u64;
            store
                .upload_session_append(chunk, &session_id, offset)
                .await?;
            offset += sent;
        }
    }

    info!("100 %");
    Ok(())
}

fn read_chunk(file: &mut File, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::with_capacity(limit);
    file.by_ref().take(limit as u64).read_to_end(&mut data)?;
    Ok(data)
}

// Logs when the cumulative percentage crosses a 5-point boundary, so a
// 50 GB archive doesn't produce thousands of lines.
struct Progress {
    total: u64,
    last_logged: Option<u64>,
}

impl Progress {
    fn new(total: u64) -> Self {
        Self {
            total,
            last_logged: None,
        }
    }

    fn log(&mut self, sent: u64) {
        let percentage = sent * 100 / self.total;
        match self.last_logged {
            Some(prev) if percentage <= prev + 5 => {}
            _ => {
                info!("{:3} %", percentage);
                self.last_logged = Some(percentage);
            }
        }
    }
}
