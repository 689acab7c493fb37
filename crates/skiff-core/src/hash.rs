//! Dropbox content hash
//!
//! Dropbox addresses file content with a two-level block hash: the file is
//! split into fixed 4 MiB blocks, each block is SHA-256 hashed, the raw
//! digests are concatenated in order, and the concatenation is SHA-256
//! hashed again. Reproducing the scheme locally lets us compare against the
//! `content_hash` a file's metadata reports without downloading anything.
//!
//! The digest depends only on the content and the block size, not on how
//! reads happen to be split up.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Block size fixed by the Dropbox content-hash scheme
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Compute the Dropbox content hash of a file
pub fn content_hash(path: &Path) -> Result<String> {
    content_hash_with_block_size(path, BLOCK_SIZE)
}

/// Compute the content hash with an explicit block size
///
/// The remote scheme uses [`BLOCK_SIZE`]; smaller sizes keep tests fast.
pub fn content_hash_with_block_size(path: &Path, block_size: usize) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut block_hashes = Vec::new();
    let mut block = vec![0u8; block_size];
    loop {
        let filled = read_block(&mut reader, &mut block)?;
        if filled == 0 {
            break;
        }
        block_hashes.extend_from_slice(&Sha256::digest(&block[..filled]));
    }

    Ok(hex::encode(Sha256::digest(&block_hashes)))
}

/// Compute the content hash of an in-memory buffer
///
/// Used by the mock store so uploaded bytes report the same hash the real
/// service would.
pub fn content_hash_bytes(data: &[u8], block_size: usize) -> String {
    let mut block_hashes = Vec::new();
    for block in data.chunks(block_size) {
        block_hashes.extend_from_slice(&Sha256::digest(block));
    }
    hex::encode(Sha256::digest(&block_hashes))
}

// Fill `buf` from the reader, tolerating short reads. Returns the number of
// bytes filled; less than `buf.len()` only at EOF.
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
