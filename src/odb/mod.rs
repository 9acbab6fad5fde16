//! Content-addressed object database
//!
//! Stores raw bytes keyed by their BLAKE3 digest. Identical content is stored
//! once; adds are idempotent. The tree layer consumes this interface and
//! never assumes a particular on-disk layout.

pub mod local;
pub mod memory;
pub mod state;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use state::StateCache;

use crate::error::StoreError;
use crate::types::Oid;
use std::path::PathBuf;

/// Byte-addressed object store consumed by the tree layer.
pub trait ObjectStore {
    /// Store `content` and return its digest. Idempotent for equal content.
    fn add(&self, content: &[u8]) -> Result<Oid, StoreError>;

    /// Fetch the bytes for `oid`, or `ObjectNotFound`.
    fn get(&self, oid: &Oid) -> Result<Vec<u8>, StoreError>;

    /// Whether the store currently holds bytes for `oid`.
    ///
    /// Never mutates the store and tolerates absence; I/O trouble reads as
    /// "not present".
    fn exists(&self, oid: &Oid) -> bool;

    /// Drop the object for `oid`, or `ObjectNotFound`.
    fn remove(&self, oid: &Oid) -> Result<(), StoreError>;

    /// Enumerate every stored digest.
    fn oids(&self) -> Result<Vec<Oid>, StoreError>;

    /// Check that the object for `oid` is intact. With `check_hash`, the
    /// content is re-hashed and compared against its address.
    fn verify(&self, oid: &Oid, check_hash: bool) -> Result<(), StoreError>;

    /// On-disk location of the object, when the store is file-backed.
    /// Used as the source for link-based checkout strategies.
    fn object_path(&self, _oid: &Oid) -> Option<PathBuf> {
        None
    }

    /// Resolve an abbreviated hex digest to the unique stored digest it
    /// prefixes. Fails with `UnknownReference` when nothing matches and
    /// `AmbiguousReference` when more than one object does.
    fn resolve_prefix(&self, prefix: &str) -> Result<Oid, StoreError> {
        if let Ok(full) = prefix.parse::<Oid>() {
            return Ok(full);
        }

        let mut found: Option<Oid> = None;
        for oid in self.oids()? {
            if oid.to_hex().starts_with(prefix) {
                if found.is_some() {
                    return Err(StoreError::AmbiguousReference(prefix.to_string()));
                }
                found = Some(oid);
            }
        }
        found.ok_or_else(|| StoreError::UnknownReference(prefix.to_string()))
    }
}
