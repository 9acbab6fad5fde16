//! Batch tree edits
//!
//! An ordered list of `{op, path, to}` records applied strictly in order.
//! Application is fail-fast and non-transactional: a failing operation aborts
//! the batch at its index and everything applied before it stays applied.
//! Callers that need atomicity clone the tree first and swap on success.

use crate::error::OpError;
use crate::fsio::FileSystem;
use crate::odb::ObjectStore;
use crate::tree::key::TreeKey;
use crate::tree::Tree;
use crate::types::ObjectKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Modify,
    Remove,
    Move,
    Copy,
    Test,
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatchOpKind::Add => "add",
            PatchOpKind::Modify => "modify",
            PatchOpKind::Remove => "remove",
            PatchOpKind::Move => "move",
            PatchOpKind::Copy => "copy",
            PatchOpKind::Test => "test",
        };
        f.write_str(name)
    }
}

/// One patch record.
///
/// For `add`/`modify`, `path` names external content on the filesystem and
/// `to` the tree key to insert at. For `move`/`copy`, `path` is the source
/// key and `to` the destination key. For `remove`/`test`, `path` is the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: PatchOpKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl PatchOp {
    pub fn add(path: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            op: PatchOpKind::Add,
            path: path.into(),
            to: Some(to.into()),
        }
    }

    pub fn modify(path: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            op: PatchOpKind::Modify,
            path: path.into(),
            to: Some(to.into()),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOpKind::Remove,
            path: path.into(),
            to: None,
        }
    }

    pub fn mv(path: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            op: PatchOpKind::Move,
            path: path.into(),
            to: Some(to.into()),
        }
    }

    pub fn copy(path: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            op: PatchOpKind::Copy,
            path: path.into(),
            to: Some(to.into()),
        }
    }

    pub fn test(path: impl Into<String>) -> Self {
        Self {
            op: PatchOpKind::Test,
            path: path.into(),
            to: None,
        }
    }
}

/// Read a JSON patch batch from disk.
///
/// Relative `path` values of `add`/`modify` records resolve against the
/// patch file's own directory, so a batch can ship next to the content it
/// introduces.
pub fn load_patch_file(path: &Path) -> Result<Vec<PatchOp>, OpError> {
    let text = std::fs::read_to_string(path)?;
    let mut ops: Vec<PatchOp> = serde_json::from_str(&text)
        .map_err(|e| OpError::Config(format!("malformed patch file {path:?}: {e}")))?;

    if let Some(parent) = path.parent() {
        for op in &mut ops {
            if matches!(op.op, PatchOpKind::Add | PatchOpKind::Modify) {
                let src = Path::new(&op.path);
                if src.is_relative() {
                    op.path = parent.join(src).to_string_lossy().into_owned();
                }
            }
        }
    }

    Ok(ops)
}

/// Apply a batch to `tree`, strictly in list order.
///
/// The returned error names the failing index and operation; the tree keeps
/// every mutation made by earlier operations.
pub fn apply(
    store: &dyn ObjectStore,
    fs: &dyn FileSystem,
    tree: &mut Tree,
    ops: &[PatchOp],
) -> Result<(), OpError> {
    for (index, op) in ops.iter().enumerate() {
        apply_op(store, fs, tree, op).map_err(|e| OpError::PatchFailed {
            index,
            op: op.op.to_string(),
            path: op.path.clone(),
            source: Box::new(e),
        })?;
        debug!(index, op = %op.op, path = %op.path, "applied patch operation");
    }
    Ok(())
}

fn target_key(op: &PatchOp) -> Result<TreeKey, OpError> {
    op.to
        .as_deref()
        .map(TreeKey::parse)
        .ok_or_else(|| OpError::MissingTarget(op.op.to_string()))
}

fn apply_op(
    store: &dyn ObjectStore,
    fs: &dyn FileSystem,
    tree: &mut Tree,
    op: &PatchOp,
) -> Result<(), OpError> {
    match op.op {
        PatchOpKind::Add | PatchOpKind::Modify => {
            let to = target_key(op)?;
            if op.op == PatchOpKind::Add && tree.lookup(&to).is_some() {
                return Err(OpError::KeyExists(to.to_string()));
            }
            let src = Path::new(&op.path);
            let content = fs.read(src)?;
            let meta = fs.stat(src)?;
            let oid = store.add(&content)?;
            tree.add(to, meta, ObjectKind::File(oid));
            Ok(())
        }
        PatchOpKind::Remove => {
            tree.remove(&TreeKey::parse(&op.path))?;
            Ok(())
        }
        PatchOpKind::Test => {
            tree.get(&TreeKey::parse(&op.path))?;
            Ok(())
        }
        PatchOpKind::Move | PatchOpKind::Copy => {
            let from = TreeKey::parse(&op.path);
            let to = target_key(op)?;
            let entry = *tree.get(&from)?;
            tree.add(to, entry.meta, entry.kind);
            if op.op == PatchOpKind::Move {
                tree.remove(&from)?;
            }
            Ok(())
        }
    }
}
