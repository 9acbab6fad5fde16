//! Materialize tree objects onto a filesystem
//!
//! Walks a tree depth-first, creating directories before the leaves under
//! them, and materializes each leaf with the first link strategy the
//! (store, destination) filesystem pair supports. A destination that already
//! holds the right content is skipped; one that differs is prompted about
//! unless `force`; cancellation is honored between leaves and never rolls
//! back what was already written.

use crate::error::OpError;
use crate::fsio::{FileSystem, LinkType};
use crate::hash;
use crate::object::Object;
use crate::odb::{ObjectStore, StateCache};
use crate::tree::key::TreeKey;
use crate::tree::meta::Metadata;
use crate::tree::Tree;
use crate::types::{ObjectKind, Oid};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, trace};

/// Decision callback for a destination that exists and differs: return true
/// to overwrite, false to leave the entry alone.
pub type PromptFn<'a> = &'a dyn Fn(&Path, &str) -> bool;

/// Progress callback, invoked with the processed-entry count after each leaf.
pub type ProgressFn<'a> = &'a dyn Fn(&Path, usize);

pub struct CheckoutOptions<'a> {
    /// Replace an existing destination even when content matches, to switch
    /// its link type.
    pub relink: bool,
    /// Overwrite differing destinations without asking.
    pub force: bool,
    /// Strategy preference order. The first one the filesystem pair supports
    /// wins per file; exhausting the list fails that entry's checkout.
    pub link_types: Vec<LinkType>,
    pub prompt: Option<PromptFn<'a>>,
    pub progress: Option<ProgressFn<'a>>,
    /// Checked before each leaf; set to cancel cooperatively.
    pub cancel: Option<&'a AtomicBool>,
    /// Stat-signature cache consulted before re-hashing destinations.
    pub state: Option<&'a StateCache>,
}

impl Default for CheckoutOptions<'_> {
    fn default() -> Self {
        Self {
            relink: false,
            force: false,
            link_types: vec![LinkType::Copy],
            prompt: None,
            progress: None,
            cancel: None,
            state: None,
        }
    }
}

/// Per-run counters. `completed` covers every processed leaf, whatever the
/// outcome; the monotonic progress count reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub completed: usize,
    pub materialized: usize,
    pub skipped: usize,
    pub denied: usize,
}

/// Materialize `object` at `dest`.
///
/// A blob checks out as a one-entry tree rooted at the destination path
/// itself; a tree checks out as its entries below `dest`.
#[instrument(skip_all, fields(dest = %dest.display()))]
pub fn checkout(
    dest: &Path,
    fs: &dyn FileSystem,
    object: Object,
    store: &dyn ObjectStore,
    options: &CheckoutOptions<'_>,
) -> Result<CheckoutSummary, OpError> {
    let tree = match object {
        Object::Tree(tree) => tree,
        Object::Blob(oid) => {
            let size = store.get(&oid)?.len() as u64;
            let mut tree = Tree::new();
            tree.add(
                TreeKey::root(),
                Metadata::with_size(size),
                ObjectKind::File(oid),
            );
            tree
        }
    };

    let mut summary = CheckoutSummary::default();
    checkout_tree(dest, fs, &tree, store, options, &mut summary)?;

    info!(
        completed = summary.completed,
        materialized = summary.materialized,
        skipped = summary.skipped,
        denied = summary.denied,
        "checkout finished"
    );
    Ok(summary)
}

fn checkout_tree(
    dest: &Path,
    fs: &dyn FileSystem,
    tree: &Tree,
    store: &dyn ObjectStore,
    options: &CheckoutOptions<'_>,
    summary: &mut CheckoutSummary,
) -> Result<(), OpError> {
    // Every implicit directory exists before any leaf under it materializes.
    for dir in tree.directories() {
        fs.create_dir_all(&join_key(dest, &dir))?;
    }

    for (key, entry) in tree.iter() {
        match entry.kind {
            ObjectKind::Directory(sub_oid) => {
                let sub_dest = join_key(dest, key);
                fs.create_dir_all(&sub_dest)?;
                let subtree = Tree::load(store, sub_oid).map_err(OpError::Store)?;
                checkout_tree(&sub_dest, fs, &subtree, store, options, summary)?;
            }
            ObjectKind::File(oid) => {
                if let Some(cancel) = options.cancel {
                    if cancel.load(Ordering::Relaxed) {
                        debug!(completed = summary.completed, "checkout cancelled");
                        return Err(OpError::Cancelled {
                            completed: summary.completed,
                        });
                    }
                }

                let path = join_key(dest, key);
                materialize(&path, fs, oid, entry.meta, store, options, summary)?;
                summary.completed += 1;
                if let Some(progress) = options.progress {
                    progress(&path, summary.completed);
                }
            }
        }
    }

    Ok(())
}

fn join_key(dest: &Path, key: &TreeKey) -> PathBuf {
    let mut path = dest.to_path_buf();
    for segment in key.segments() {
        path.push(segment);
    }
    path
}

fn materialize(
    path: &Path,
    fs: &dyn FileSystem,
    oid: Oid,
    meta: Metadata,
    store: &dyn ObjectStore,
    options: &CheckoutOptions<'_>,
    summary: &mut CheckoutSummary,
) -> Result<(), OpError> {
    if fs.exists(path) {
        let satisfied = destination_matches(path, fs, &oid, options.state)?;

        if satisfied && !options.relink {
            trace!(path = %path.display(), "destination already satisfied");
            summary.skipped += 1;
            return Ok(());
        }

        if !satisfied && !options.force {
            let allowed = options
                .prompt
                .map_or(false, |prompt| prompt(path, "destination exists and differs"));
            if !allowed {
                debug!(path = %path.display(), "overwrite denied; entry left as-is");
                summary.denied += 1;
                return Ok(());
            }
        }

        fs.remove(path)?;
        if let Some(state) = options.state {
            state.forget(path)?;
        }
    }

    let used = transfer(path, fs, &oid, store, &options.link_types)?;

    // Strategies that produce an independent inode take the entry's mode;
    // chmod through a shared inode or symlink would reach the store copy.
    if matches!(used, LinkType::Copy | LinkType::Reflink) {
        fs.set_mode(path, meta.mode)?;
    }

    if let Some(state) = options.state {
        if let Ok(fs_meta) = std::fs::metadata(path) {
            state.record(path, &oid, &fs_meta)?;
        }
    }

    summary.materialized += 1;
    Ok(())
}

/// Whether the destination already holds the content addressed by `oid`.
/// Fresh state-cache entries answer without re-hashing.
fn destination_matches(
    path: &Path,
    fs: &dyn FileSystem,
    oid: &Oid,
    state: Option<&StateCache>,
) -> Result<bool, OpError> {
    if let Some(state) = state {
        if let Ok(fs_meta) = std::fs::metadata(path) {
            if let Some(known) = state.lookup(path, &fs_meta)? {
                return Ok(known == *oid);
            }
        }
    }

    let actual = hash::hash_bytes(&fs.read(path)?);
    if let (Some(state), Ok(fs_meta)) = (state, std::fs::metadata(path)) {
        state.record(path, &actual, &fs_meta)?;
    }
    Ok(actual == *oid)
}

/// Try the configured strategies in order; the first success wins.
fn transfer(
    path: &Path,
    fs: &dyn FileSystem,
    oid: &Oid,
    store: &dyn ObjectStore,
    link_types: &[LinkType],
) -> Result<LinkType, OpError> {
    for strategy in link_types {
        match strategy {
            LinkType::Copy => {
                // Copy never depends on the store being file-backed.
                let bytes = store.get(oid)?;
                fs.write(path, &bytes)?;
                trace!(path = %path.display(), "materialized via copy");
                return Ok(LinkType::Copy);
            }
            other => {
                let Some(src) = store.object_path(oid) else {
                    debug!(strategy = %other, "store is not file-backed; skipping strategy");
                    continue;
                };
                match fs.link(*other, &src, path) {
                    Ok(()) => {
                        trace!(path = %path.display(), strategy = %other, "materialized via link");
                        return Ok(*other);
                    }
                    Err(e) => {
                        debug!(strategy = %other, error = %e, "link strategy failed; trying next");
                    }
                }
            }
        }
    }

    Err(OpError::Link {
        path: path.to_path_buf(),
    })
}
