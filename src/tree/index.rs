//! Derived prefix index over tree keys
//!
//! Answers ancestor/descendant queries (which directory prefixes exist, what
//! are a prefix's children) without rescanning the whole key set. The index is
//! a cache, never authoritative: trees drop it on every structural mutation
//! and rebuild it lazily on the next query.

use crate::tree::key::TreeKey;
use std::collections::{BTreeMap, BTreeSet};

/// Index of the implicit directory structure spanned by a set of keys.
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    /// Directory prefix -> immediate child segment names.
    children: BTreeMap<TreeKey, BTreeSet<String>>,
}

impl PrefixIndex {
    /// Build the index from a sorted (or unsorted) key iterator.
    pub fn build<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a TreeKey>,
    {
        let mut children: BTreeMap<TreeKey, BTreeSet<String>> = BTreeMap::new();

        for key in keys {
            let segments = key.segments();
            let mut prefix = TreeKey::root();
            for segment in segments {
                children
                    .entry(prefix.clone())
                    .or_default()
                    .insert(segment.clone());
                prefix = prefix.child(segment);
            }
        }

        Self { children }
    }

    /// Whether the key is a prefix of at least one indexed key.
    pub fn contains_prefix(&self, key: &TreeKey) -> bool {
        self.children.contains_key(key)
    }

    /// Immediate child segment names under a prefix, sorted.
    pub fn children_of(&self, key: &TreeKey) -> Vec<&str> {
        self.children
            .get(key)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// All non-root directory prefixes, sorted shallow-first.
    ///
    /// A prefix appears here if some key has it as a proper ancestor, which is
    /// exactly the set of directories a checkout must create before leaves.
    pub fn directories(&self) -> Vec<TreeKey> {
        self.children
            .keys()
            .filter(|k| !k.is_root())
            .cloned()
            .collect()
    }
}
