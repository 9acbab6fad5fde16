//! Merkle tree objects
//!
//! A `Tree` is an ordered map from path key to (metadata, content digest).
//! Its own digest is a pure function of the sorted entry triples; any
//! structural mutation invalidates both the cached digest and the derived
//! prefix index until they are recomputed.

pub mod builder;
pub mod index;
pub mod key;
pub mod meta;
pub mod walker;

use crate::error::{OpError, StoreError};
use crate::hash;
use crate::odb::ObjectStore;
use crate::tree::index::PrefixIndex;
use crate::tree::key::TreeKey;
use crate::tree::meta::Metadata;
use crate::types::{ObjectKind, Oid};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One (metadata, digest) record within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry {
    pub meta: Metadata,
    pub kind: ObjectKind,
}

impl TreeEntry {
    pub fn file(meta: Metadata, oid: Oid) -> Self {
        Self {
            meta,
            kind: ObjectKind::File(oid),
        }
    }

    pub fn directory(meta: Metadata, oid: Oid) -> Self {
        Self {
            meta,
            kind: ObjectKind::Directory(oid),
        }
    }

    /// The referenced content digest.
    pub fn oid(&self) -> Oid {
        self.kind.oid()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Serialized form of one entry within the canonical tree bytes.
#[derive(Serialize, Deserialize)]
struct RawEntry {
    path: String,
    kind: RawKind,
    oid: Oid,
    #[serde(flatten)]
    meta: Metadata,
}

#[derive(Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    File,
    Dir,
}

/// An ordered path-key map forming one directory snapshot.
///
/// Not internally synchronized for mutation; concurrent edits of one instance
/// must be serialized by the caller. The prefix index uses a lock only so the
/// lazily-rebuilt cache can be filled behind a shared reference.
#[derive(Debug)]
pub struct Tree {
    entries: BTreeMap<TreeKey, TreeEntry>,
    oid: Option<Oid>,
    index: RwLock<Option<PrefixIndex>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Tree {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            oid: self.oid,
            index: RwLock::new(None),
        }
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Tree {}

impl FromIterator<(TreeKey, TreeEntry)> for Tree {
    fn from_iter<I: IntoIterator<Item = (TreeKey, TreeEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            oid: None,
            index: RwLock::new(None),
        }
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            oid: None,
            index: RwLock::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite the entry at `key`.
    ///
    /// Overwrite is allowed; callers that need add-only semantics check
    /// presence first (the patch engine does).
    pub fn add(&mut self, key: TreeKey, meta: Metadata, kind: ObjectKind) {
        self.entries.insert(key, TreeEntry { meta, kind });
        self.invalidate();
    }

    /// Entry at `key`, or `KeyNotFound`.
    pub fn get(&self, key: &TreeKey) -> Result<&TreeEntry, OpError> {
        self.entries
            .get(key)
            .ok_or_else(|| OpError::KeyNotFound(key.to_string()))
    }

    /// Entry at `key`, if present.
    pub fn lookup(&self, key: &TreeKey) -> Option<&TreeEntry> {
        self.entries.get(key)
    }

    /// Remove the entry at `key`, or fail with `KeyNotFound`.
    pub fn remove(&mut self, key: &TreeKey) -> Result<TreeEntry, OpError> {
        let removed = self
            .entries
            .remove(key)
            .ok_or_else(|| OpError::KeyNotFound(key.to_string()))?;
        self.invalidate();
        Ok(removed)
    }

    /// Entries in sorted key order.
    ///
    /// Iteration always reflects the current entry set; re-iterating after a
    /// mutation yields the new state.
    pub fn iter(&self) -> impl Iterator<Item = (&TreeKey, &TreeEntry)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TreeKey> {
        self.entries.keys()
    }

    /// The digest computed by the last `digest()` or `load()`, if no mutation
    /// has happened since.
    pub fn oid(&self) -> Option<Oid> {
        self.oid
    }

    /// Recompute and cache the tree's own digest.
    pub fn digest(&mut self) -> Result<Oid, StoreError> {
        let oid = self.computed_oid()?;
        self.oid = Some(oid);
        Ok(oid)
    }

    /// Digest of the current entry set, without touching the cache.
    pub fn computed_oid(&self) -> Result<Oid, StoreError> {
        Ok(hash::hash_bytes(&self.to_bytes()?))
    }

    /// Canonical serialization: a JSON array of entries in sorted key order.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let raw: Vec<RawEntry> = self
            .entries
            .iter()
            .map(|(key, entry)| RawEntry {
                path: key.to_string(),
                kind: match entry.kind {
                    ObjectKind::File(_) => RawKind::File,
                    ObjectKind::Directory(_) => RawKind::Dir,
                },
                oid: entry.oid(),
                meta: entry.meta,
            })
            .collect();
        serde_json::to_vec(&raw)
            .map_err(|e| StoreError::ObjectFormat(format!("failed to serialize tree: {e}")))
    }

    /// Parse serialized tree bytes. Fails on malformed input or duplicate
    /// path keys.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let raw: Vec<RawEntry> = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::ObjectFormat(format!("malformed tree object: {e}")))?;

        let mut entries = BTreeMap::new();
        for r in raw {
            let key = TreeKey::parse(&r.path);
            let kind = match r.kind {
                RawKind::File => ObjectKind::File(r.oid),
                RawKind::Dir => ObjectKind::Directory(r.oid),
            };
            if entries
                .insert(key.clone(), TreeEntry { meta: r.meta, kind })
                .is_some()
            {
                return Err(StoreError::ObjectFormat(format!(
                    "duplicate path key: {key}"
                )));
            }
        }

        Ok(Self {
            entries,
            oid: None,
            index: RwLock::new(None),
        })
    }

    /// Fetch and deserialize a tree from the object store.
    ///
    /// Fails with an object-format error if the bytes are malformed, and with
    /// a hash mismatch if the recomputed digest differs from `oid` (which also
    /// rejects non-canonical encodings).
    pub fn load(store: &dyn ObjectStore, oid: Oid) -> Result<Self, StoreError> {
        let bytes = store.get(&oid)?;
        let mut tree = Self::from_bytes(&bytes)?;
        let actual = tree.computed_oid()?;
        if actual != oid {
            return Err(StoreError::HashMismatch {
                expected: oid,
                actual,
            });
        }
        tree.oid = Some(oid);
        Ok(tree)
    }

    /// Finalize the digest and write the canonical bytes to the store.
    pub fn persist(&mut self, store: &dyn ObjectStore) -> Result<Oid, StoreError> {
        let expected = self.digest()?;
        let stored = store.add(&self.to_bytes()?)?;
        if stored != expected {
            return Err(StoreError::HashMismatch {
                expected,
                actual: stored,
            });
        }
        Ok(expected)
    }

    /// Check that every referenced child digest is present in the store.
    pub fn verify(&self, store: &dyn ObjectStore) -> Result<(), StoreError> {
        for (_, entry) in self.iter() {
            let oid = entry.oid();
            if !store.exists(&oid) {
                return Err(StoreError::ObjectNotFound(oid));
            }
        }
        Ok(())
    }

    /// Implicit directory prefixes spanned by the key set, shallow-first.
    pub fn directories(&self) -> Vec<TreeKey> {
        self.with_index(|idx| idx.directories())
    }

    /// Immediate child segment names under a prefix.
    pub fn children_of(&self, prefix: &TreeKey) -> Vec<String> {
        self.with_index(|idx| {
            idx.children_of(prefix)
                .into_iter()
                .map(str::to_string)
                .collect()
        })
    }

    /// Whether `prefix` is an ancestor of at least one key.
    pub fn contains_prefix(&self, prefix: &TreeKey) -> bool {
        self.with_index(|idx| idx.contains_prefix(prefix))
    }

    /// Run a query against the prefix index, rebuilding it if a mutation has
    /// invalidated it. The cache is only ever reached through here.
    fn with_index<R>(&self, f: impl FnOnce(&PrefixIndex) -> R) -> R {
        {
            let guard = self.index.read();
            if let Some(idx) = guard.as_ref() {
                return f(idx);
            }
        }
        let mut guard = self.index.write();
        let idx = guard.get_or_insert_with(|| PrefixIndex::build(self.entries.keys()));
        f(idx)
    }

    fn invalidate(&mut self) {
        self.oid = None;
        *self.index.get_mut() = None;
    }
}

/// Total content size referenced by a tree, descending into sub-trees.
pub fn du(store: &dyn ObjectStore, tree: &Tree) -> Result<u64, StoreError> {
    let mut total: u64 = 0;
    for (_, entry) in tree.iter() {
        match entry.kind {
            ObjectKind::File(_) => total += entry.meta.size,
            ObjectKind::Directory(sub_oid) => {
                let subtree = Tree::load(store, sub_oid)?;
                total += du(store, &subtree)?;
            }
        }
    }
    Ok(total)
}
