//! Error types for the snaptree object store and tree operations.

use crate::types::Oid;
use std::path::PathBuf;
use thiserror::Error;

/// Object-store level errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    ObjectNotFound(Oid),

    #[error("No object matches prefix: {0}")]
    UnknownReference(String),

    #[error("Ambiguous object prefix: {0}")]
    AmbiguousReference(String),

    #[error("Object format error: {0}")]
    ObjectFormat(String),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Oid, actual: Oid },

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tree, patch, merge, and checkout level errors
#[derive(Debug, Error)]
pub enum OpError {
    #[error("Path not found in tree: {0}")]
    KeyNotFound(String),

    #[error("Path already exists in tree: {0}")]
    KeyExists(String),

    #[error("Merge conflict in {0:?}")]
    Conflict(Vec<String>),

    #[error("No link strategy succeeded for {path:?}")]
    Link { path: PathBuf },

    #[error("Patch operation {index} ({op} {path}) failed: {source}")]
    PatchFailed {
        index: usize,
        op: String,
        path: String,
        #[source]
        source: Box<OpError>,
    },

    #[error("Patch operation '{0}' requires a 'to' target")]
    MissingTarget(String),

    #[error("Checkout cancelled after {completed} entries")]
    Cancelled { completed: usize },

    #[error("Not a snaptree repository (or any parent of): {0:?}")]
    NotARepo(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpError {
    /// True when the error is the per-key `KeyNotFound` case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OpError::KeyNotFound(_))
    }
}
