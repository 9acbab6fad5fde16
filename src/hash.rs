//! Content hashing using BLAKE3
//!
//! All digests in the store are BLAKE3 over raw content bytes: a file's
//! contents for blobs, the canonical serialization for trees.

use crate::types::Oid;
use blake3::Hasher;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUF_LEN: usize = 64 * 1024;

/// Compute the digest of a byte slice.
pub fn hash_bytes(data: &[u8]) -> Oid {
    let mut hasher = Hasher::new();
    hasher.update(data);
    Oid::from_bytes(*hasher.finalize().as_bytes())
}

/// Compute the digest of everything a reader yields.
///
/// Returns the digest together with the number of bytes consumed.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<(Oid, u64)> {
    let mut hasher = Hasher::new();
    let mut buf = [0u8; READ_BUF_LEN];
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    Ok((Oid::from_bytes(*hasher.finalize().as_bytes()), total))
}

/// Compute the digest of a file's contents without loading it whole.
pub fn hash_file(path: &Path) -> io::Result<(Oid, u64)> {
    let file = File::open(path)?;
    hash_reader(file)
}
