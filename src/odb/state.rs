//! Checkout state cache
//!
//! Remembers which digest a destination path last materialized to, together
//! with the stat signature (size + mtime) observed immediately afterwards.
//! An incremental re-checkout consults the cache first and only re-hashes a
//! destination whose signature has drifted.

use crate::error::StoreError;
use crate::types::Oid;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::trace;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct StateRecord {
    oid: Oid,
    size: u64,
    mtime_ns: i64,
}

/// Sled-backed path -> (oid, stat signature) cache.
pub struct StateCache {
    db: sled::Db,
}

impl StateCache {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| {
            StoreError::Io(std::io::Error::other(format!(
                "failed to open state cache: {e}"
            )))
        })?;
        Ok(Self { db })
    }

    /// Record that `path` currently holds the content addressed by `oid`.
    pub fn record(
        &self,
        path: &Path,
        oid: &Oid,
        meta: &std::fs::Metadata,
    ) -> Result<(), StoreError> {
        let record = StateRecord {
            oid: *oid,
            size: meta.len(),
            mtime_ns: mtime_ns(meta),
        };
        let value = bincode::serialize(&record).map_err(|e| {
            StoreError::Io(std::io::Error::other(format!(
                "failed to serialize state record: {e}"
            )))
        })?;
        self.db
            .insert(key_for(path), value)
            .map_err(sled_io_error)?;
        Ok(())
    }

    /// The digest `path` is known to hold, if its stat signature still
    /// matches what was recorded. A drifted signature yields `None`; the
    /// caller re-hashes and re-records.
    pub fn lookup(
        &self,
        path: &Path,
        meta: &std::fs::Metadata,
    ) -> Result<Option<Oid>, StoreError> {
        let Some(value) = self.db.get(key_for(path)).map_err(sled_io_error)? else {
            return Ok(None);
        };

        let record: StateRecord = match bincode::deserialize(&value) {
            Ok(r) => r,
            Err(_) => {
                trace!(path = %path.display(), "discarding unreadable state record");
                return Ok(None);
            }
        };

        if record.size == meta.len() && record.mtime_ns == mtime_ns(meta) {
            Ok(Some(record.oid))
        } else {
            Ok(None)
        }
    }

    /// Drop the record for `path`, if any.
    pub fn forget(&self, path: &Path) -> Result<(), StoreError> {
        self.db.remove(key_for(path)).map_err(sled_io_error)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(sled_io_error)?;
        Ok(())
    }
}

fn key_for(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

fn mtime_ns(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_nanos()).ok())
        .unwrap_or(0)
}

fn sled_io_error(e: sled::Error) -> StoreError {
    StoreError::Io(std::io::Error::other(format!("state cache error: {e}")))
}
