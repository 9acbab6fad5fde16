//! Building tree objects from filesystem state
//!
//! Walks a directory, hashes every file, and produces a tree keyed by
//! root-relative paths. The default build is flat: one tree whose keys reach
//! every leaf. A shallow build instead snapshots each top-level subdirectory
//! as its own stored tree object and references it through a directory entry.

use crate::error::OpError;
use crate::hash;
use crate::odb::ObjectStore;
use crate::tree::key::TreeKey;
use crate::tree::meta::Metadata;
use crate::tree::walker::{WalkEntry, Walker, WalkerConfig};
use crate::tree::Tree;
use crate::types::ObjectKind;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Write file contents into the object store. Without this the tree is
    /// computed (digests and all) but only tree objects are stored.
    pub write: bool,
    /// Snapshot top-level subdirectories as separate tree objects.
    pub shallow: bool,
    /// Walk configuration (ignore list, symlink policy, depth).
    pub walker: WalkerConfig,
}

pub struct TreeBuilder {
    root: PathBuf,
    options: BuildOptions,
}

impl TreeBuilder {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a tree for the configured root.
    ///
    /// The returned tree is digest-valid: `digest()` has been computed, and
    /// in shallow mode every referenced sub-tree object is already stored.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn build(&self, store: &dyn ObjectStore) -> Result<Tree, OpError> {
        let start = Instant::now();

        let walker = Walker::with_config(self.root.clone(), self.options.walker.clone());
        let entries = walker.walk()?;
        debug!(entry_count = entries.len(), "walked filesystem");

        let mut files = Vec::new();
        for entry in entries {
            if let WalkEntry::File { path, .. } = entry {
                files.push(path);
            }
        }

        let mut tree = if self.options.shallow {
            self.build_shallow(store, &files)?
        } else {
            self.build_flat(store, &files)?
        };

        let oid = tree.digest()?;
        info!(
            entries = tree.len(),
            oid = %oid.short(),
            duration_ms = start.elapsed().as_millis(),
            "tree build completed"
        );
        Ok(tree)
    }

    fn build_flat(&self, store: &dyn ObjectStore, files: &[PathBuf]) -> Result<Tree, OpError> {
        let mut tree = Tree::new();
        for path in files {
            let (key, meta, oid) = self.snapshot_file(store, path)?;
            tree.add(key, meta, ObjectKind::File(oid));
        }
        Ok(tree)
    }

    /// One tree object per top-level subdirectory; root-level files stay
    /// direct entries.
    fn build_shallow(&self, store: &dyn ObjectStore, files: &[PathBuf]) -> Result<Tree, OpError> {
        let mut tree = Tree::new();
        let mut groups: BTreeMap<String, Vec<(TreeKey, Metadata, crate::types::Oid)>> =
            BTreeMap::new();

        for path in files {
            let (key, meta, oid) = self.snapshot_file(store, path)?;
            if key.depth() == 1 {
                tree.add(key, meta, ObjectKind::File(oid));
            } else {
                let top = key.segments()[0].clone();
                let rest = TreeKey::from_segments(&key.segments()[1..]);
                groups.entry(top).or_default().push((rest, meta, oid));
            }
        }

        for (name, entries) in groups {
            let mut subtree = Tree::new();
            for (key, meta, oid) in entries {
                subtree.add(key, meta, ObjectKind::File(oid));
            }
            let sub_oid = subtree.persist(store)?;

            let dir_meta = fs::metadata(self.root.join(&name))
                .map(|m| Metadata::from_fs(&m))
                .unwrap_or_default();
            tree.add(
                TreeKey::parse(&name),
                dir_meta,
                ObjectKind::Directory(sub_oid),
            );
        }

        Ok(tree)
    }

    fn snapshot_file(
        &self,
        store: &dyn ObjectStore,
        path: &Path,
    ) -> Result<(TreeKey, Metadata, crate::types::Oid), OpError> {
        let rel = path.strip_prefix(&self.root).map_err(|_| {
            OpError::Config(format!(
                "walked path {path:?} escapes build root {:?}",
                self.root
            ))
        })?;
        let key = TreeKey::from_segments(rel.iter().map(|c| c.to_string_lossy()));

        let content = fs::read(path)?;
        let meta = Metadata::from_fs(&fs::metadata(path)?);
        let oid = if self.options.write {
            store.add(&content)?
        } else {
            hash::hash_bytes(&content)
        };

        Ok((key, meta, oid))
    }
}
