//! Entry metadata
//!
//! Non-content attributes of a filesystem entry. Metadata round-trips through
//! tree serialization unchanged; the digest of a tree covers these fields.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::UNIX_EPOCH;

const DEFAULT_FILE_MODE: u32 = 0o644;
const EXEC_BITS: u32 = 0o111;

/// Non-content attributes of one tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Content length in bytes (0 for directories).
    pub size: u64,
    /// Unix permission bits.
    #[serde(default = "default_mode")]
    pub mode: u32,
    /// Modification time, nanoseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<i64>,
}

fn default_mode() -> u32 {
    DEFAULT_FILE_MODE
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            size: 0,
            mode: DEFAULT_FILE_MODE,
            mtime: None,
        }
    }
}

impl Metadata {
    pub fn with_size(size: u64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Whether any execute bit is set.
    pub fn is_exec(&self) -> bool {
        self.mode & EXEC_BITS != 0
    }

    /// Modification time as a UTC datetime, when representable.
    pub fn mtime_utc(&self) -> Option<DateTime<Utc>> {
        self.mtime.map(|ns| Utc.timestamp_nanos(ns))
    }

    /// Capture metadata from a filesystem stat result.
    pub fn from_fs(meta: &std::fs::Metadata) -> Self {
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_nanos()).ok());

        Self {
            size: meta.len(),
            mode: fs_mode(meta),
            mtime,
        }
    }
}

#[cfg(unix)]
fn fs_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn fs_mode(_meta: &std::fs::Metadata) -> u32 {
    DEFAULT_FILE_MODE
}
