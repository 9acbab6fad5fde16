//! Tree path keys
//!
//! A key is an ordered sequence of path segments; the empty sequence denotes
//! the tree's own root entry. Keys order lexicographically by segment
//! sequence, which fixes both serialization order and diff output order.

use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Ordered sequence of path segments identifying one entry in a tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TreeKey(Vec<String>);

impl TreeKey {
    /// The empty key, denoting the tree's own root entry.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a key from raw segments. Segments are normalized to NFC so that
    /// differently-composed Unicode spellings of the same path compare equal.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            segments
                .into_iter()
                .map(|s| s.as_ref().nfc().collect())
                .collect(),
        )
    }

    /// Parse a `/`-separated path. Empty segments (leading, trailing, or
    /// doubled slashes) are dropped; an empty or all-slash string yields the
    /// root key.
    pub fn parse(path: &str) -> Self {
        Self::from_segments(path.split('/').filter(|s| !s.is_empty()))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Final segment, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Key with the final segment removed. Root has no parent.
    pub fn parent(&self) -> Option<TreeKey> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append one segment.
    pub fn child(&self, name: &str) -> TreeKey {
        let mut segments = self.0.clone();
        segments.push(name.nfc().collect());
        Self(segments)
    }

    /// Concatenate two keys. Joining with root on either side is identity.
    pub fn join(&self, other: &TreeKey) -> TreeKey {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Whether `prefix` is an ancestor of (or equal to) this key.
    pub fn starts_with(&self, prefix: &TreeKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}
