//! Structural diff between two tree snapshots
//!
//! Classifies the union of two trees' path keys into added, deleted,
//! modified, and unchanged. Both trees iterate in the same lexicographic key
//! order, so a single merge-walk covers the union without quadratic
//! comparison and the output order is deterministic. Directory entries whose
//! digests differ are expanded into leaf-level changes by loading the
//! referenced sub-trees.

use crate::error::StoreError;
use crate::object::Object;
use crate::odb::ObjectStore;
use crate::tree::key::TreeKey;
use crate::tree::meta::Metadata;
use crate::tree::{Tree, TreeEntry};
use crate::types::Oid;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// One side of a classified change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub key: TreeKey,
    /// Metadata, when the side is a concrete tree entry (the synthetic root
    /// has none).
    pub meta: Option<Metadata>,
    pub oid: Oid,
    /// Whether the object store currently holds the referenced bytes.
    /// Informational only.
    pub in_cache: bool,
}

/// A classified change: the old and/or new side of one path key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub old: Option<DiffEntry>,
    pub new: Option<DiffEntry>,
}

impl Change {
    /// The path key, from whichever side is present.
    pub fn key(&self) -> &TreeKey {
        self.old
            .as_ref()
            .or(self.new.as_ref())
            .map(|e| &e.key)
            .expect("change with neither side")
    }
}

/// The four disjoint classifications over the union of path keys.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    pub added: Vec<Change>,
    pub deleted: Vec<Change>,
    pub modified: Vec<Change>,
    pub unchanged: Vec<Change>,
}

impl DiffResult {
    /// Non-root modified paths; what a non-forced merge treats as conflicts.
    pub fn conflicts(&self) -> Vec<String> {
        self.modified
            .iter()
            .filter(|c| !c.key().is_root())
            .map(|c| c.key().to_string())
            .collect()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiffOptions {
    /// How deep to expand modified directory entries into leaf-level changes.
    /// `None` expands without bound.
    pub max_depth: Option<usize>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { max_depth: None }
    }
}

/// Diff two snapshots with full directory expansion.
///
/// A missing side is treated as having no entries, so `diff(None, Some(t))`
/// classifies everything in `t` as added.
pub fn diff(
    old: Option<&Tree>,
    new: Option<&Tree>,
    store: &dyn ObjectStore,
) -> Result<DiffResult, StoreError> {
    diff_with_options(old, new, store, DiffOptions::default())
}

pub fn diff_with_options(
    old: Option<&Tree>,
    new: Option<&Tree>,
    store: &dyn ObjectStore,
    options: DiffOptions,
) -> Result<DiffResult, StoreError> {
    let mut result = DiffResult::default();

    // The root entry compares the snapshots' own digests.
    let old_root = root_entry(old, store)?;
    let new_root = root_entry(new, store)?;
    classify_root(old_root, new_root, &mut result);

    walk(
        store,
        &entries_of(old),
        &entries_of(new),
        &TreeKey::root(),
        0,
        options,
        &mut result,
    )?;

    debug!(
        added = result.added.len(),
        deleted = result.deleted.len(),
        modified = result.modified.len(),
        unchanged = result.unchanged.len(),
        "diff complete"
    );
    Ok(result)
}

/// Diff two loaded objects. A blob side contributes only its root entry, so
/// diffing two blobs compares their digests directly; a tree side behaves as
/// in [`diff`].
pub fn diff_objects(
    old: &Object,
    new: &Object,
    store: &dyn ObjectStore,
) -> Result<DiffResult, StoreError> {
    let mut result = DiffResult::default();

    let old_root = object_root(old, store)?;
    let new_root = object_root(new, store)?;
    classify_root(Some(old_root), Some(new_root), &mut result);

    let old_entries = match old {
        Object::Tree(tree) => entries_of(Some(tree)),
        Object::Blob(_) => Vec::new(),
    };
    let new_entries = match new {
        Object::Tree(tree) => entries_of(Some(tree)),
        Object::Blob(_) => Vec::new(),
    };
    walk(
        store,
        &old_entries,
        &new_entries,
        &TreeKey::root(),
        0,
        DiffOptions::default(),
        &mut result,
    )?;

    Ok(result)
}

fn object_root(object: &Object, store: &dyn ObjectStore) -> Result<DiffEntry, StoreError> {
    match object {
        Object::Tree(tree) => {
            let oid = match tree.oid() {
                Some(oid) => oid,
                None => tree.computed_oid()?,
            };
            Ok(DiffEntry {
                key: TreeKey::root(),
                meta: None,
                oid,
                in_cache: store.exists(&oid),
            })
        }
        Object::Blob(oid) => Ok(DiffEntry {
            key: TreeKey::root(),
            meta: None,
            oid: *oid,
            in_cache: store.exists(oid),
        }),
    }
}

fn classify_root(
    old_root: Option<DiffEntry>,
    new_root: Option<DiffEntry>,
    result: &mut DiffResult,
) {
    match (old_root, new_root) {
        (None, None) => {}
        (Some(o), None) => result.deleted.push(Change {
            old: Some(o),
            new: None,
        }),
        (None, Some(n)) => result.added.push(Change {
            old: None,
            new: Some(n),
        }),
        (Some(o), Some(n)) => {
            let change = Change {
                old: Some(o.clone()),
                new: Some(n.clone()),
            };
            if o.oid == n.oid {
                result.unchanged.push(change);
            } else {
                result.modified.push(change);
            }
        }
    }
}

fn root_entry(
    tree: Option<&Tree>,
    store: &dyn ObjectStore,
) -> Result<Option<DiffEntry>, StoreError> {
    tree.map(|t| {
        let oid = match t.oid() {
            Some(oid) => oid,
            None => t.computed_oid()?,
        };
        Ok(DiffEntry {
            key: TreeKey::root(),
            meta: None,
            oid,
            in_cache: store.exists(&oid),
        })
    })
    .transpose()
}

fn entries_of(tree: Option<&Tree>) -> Vec<(TreeKey, TreeEntry)> {
    tree.map(|t| t.iter().map(|(k, e)| (k.clone(), *e)).collect())
        .unwrap_or_default()
}

fn side_entry(store: &dyn ObjectStore, key: TreeKey, entry: &TreeEntry) -> DiffEntry {
    let oid = entry.oid();
    DiffEntry {
        key,
        meta: Some(entry.meta),
        oid,
        in_cache: store.exists(&oid),
    }
}

fn expands(options: DiffOptions, depth: usize) -> bool {
    options.max_depth.map_or(true, |max| depth < max)
}

/// Merge-walk two sorted entry slices, recursing into differing directories.
fn walk(
    store: &dyn ObjectStore,
    old: &[(TreeKey, TreeEntry)],
    new: &[(TreeKey, TreeEntry)],
    prefix: &TreeKey,
    depth: usize,
    options: DiffOptions,
    result: &mut DiffResult,
) -> Result<(), StoreError> {
    let (mut i, mut j) = (0usize, 0usize);

    while i < old.len() || j < new.len() {
        let order = match (old.get(i), new.get(j)) {
            (Some((ok, _)), Some((nk, _))) => ok.cmp(nk),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        match order {
            Ordering::Less => {
                let (key, entry) = &old[i];
                one_side(store, prefix.join(key), entry, Side::Old, depth, options, result)?;
                i += 1;
            }
            Ordering::Greater => {
                let (key, entry) = &new[j];
                one_side(store, prefix.join(key), entry, Side::New, depth, options, result)?;
                j += 1;
            }
            Ordering::Equal => {
                let (key, old_entry) = &old[i];
                let (_, new_entry) = &new[j];
                let full = prefix.join(key);

                if old_entry.oid() == new_entry.oid() {
                    result.unchanged.push(Change {
                        old: Some(side_entry(store, full.clone(), old_entry)),
                        new: Some(side_entry(store, full, new_entry)),
                    });
                } else if old_entry.is_dir() && new_entry.is_dir() && expands(options, depth) {
                    match (
                        Tree::load(store, old_entry.oid()),
                        Tree::load(store, new_entry.oid()),
                    ) {
                        (Ok(old_sub), Ok(new_sub)) => {
                            trace!(key = %full, "expanding modified directory");
                            walk(
                                store,
                                &entries_of(Some(&old_sub)),
                                &entries_of(Some(&new_sub)),
                                &full,
                                depth + 1,
                                options,
                                result,
                            )?;
                        }
                        _ => {
                            // Sub-tree bytes unavailable; report at directory
                            // granularity instead of failing the diff.
                            result.modified.push(Change {
                                old: Some(side_entry(store, full.clone(), old_entry)),
                                new: Some(side_entry(store, full, new_entry)),
                            });
                        }
                    }
                } else {
                    result.modified.push(Change {
                        old: Some(side_entry(store, full.clone(), old_entry)),
                        new: Some(side_entry(store, full, new_entry)),
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Side {
    Old,
    New,
}

/// Classify an entry present on only one side, expanding directories into
/// their leaves when the sub-tree is loadable.
fn one_side(
    store: &dyn ObjectStore,
    full: TreeKey,
    entry: &TreeEntry,
    side: Side,
    depth: usize,
    options: DiffOptions,
    result: &mut DiffResult,
) -> Result<(), StoreError> {
    if entry.is_dir() && expands(options, depth) {
        if let Ok(subtree) = Tree::load(store, entry.oid()) {
            let sub_entries = entries_of(Some(&subtree));
            return match side {
                Side::Old => walk(store, &sub_entries, &[], &full, depth + 1, options, result),
                Side::New => walk(store, &[], &sub_entries, &full, depth + 1, options, result),
            };
        }
    }

    let diff_entry = side_entry(store, full, entry);
    match side {
        Side::Old => result.deleted.push(Change {
            old: Some(diff_entry),
            new: None,
        }),
        Side::New => result.added.push(Change {
            old: None,
            new: Some(diff_entry),
        }),
    }
    Ok(())
}
