//! Core content-addressing types
//!
//! `Oid` is a 32-byte BLAKE3 digest newtype with a hex `Display`/`FromStr`
//! and serde-as-hex-string representation; equal content yields an equal oid.
//! `ObjectKind` is the tagged variant distinguishing a file blob reference
//! from a sub-directory tree reference.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of a digest.
pub const OID_LEN: usize = 32;

/// Number of leading hex characters shown by [`Oid::short`].
const SHORT_LEN: usize = 12;

/// A content digest: a 32-byte BLAKE3 hash identifying stored bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid([u8; OID_LEN]);

impl Oid {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; OID_LEN]) -> Self {
        Oid(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    /// Full lowercase hex encoding (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex prefix for human-facing output.
    pub fn short(&self) -> String {
        self.to_hex()[..SHORT_LEN].to_string()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.to_hex())
    }
}

/// Error from parsing an [`Oid`] out of a hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidParseError(pub String);

impl fmt::Display for OidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for OidParseError {}

impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| OidParseError(format!("invalid oid hex: {e}")))?;
        if bytes.len() != OID_LEN {
            return Err(OidParseError(format!(
                "oid must be {OID_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; OID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Oid(arr))
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Oid::from_str(&s).map_err(de::Error::custom)
    }
}

/// The two kinds of object a tree entry can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A file blob, addressed by its content digest.
    File(Oid),
    /// A sub-directory, addressed by its tree object's digest.
    Directory(Oid),
}

impl ObjectKind {
    /// The referenced content digest, whichever kind this is.
    pub fn oid(&self) -> Oid {
        match self {
            ObjectKind::File(oid) | ObjectKind::Directory(oid) => *oid,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ObjectKind::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, ObjectKind::Directory(_))
    }
}
