//! Merging two tree snapshots
//!
//! Conflict detection rides on the diff engine: without `force`, any non-root
//! modified key fails the merge and every conflicting path is reported at
//! once. The result overlays b's entries onto a's, so paths b introduced or
//! changed win while paths only in a survive. The merged tree stays
//! digest-invalid until the caller finalizes it.

use crate::diff::diff;
use crate::error::OpError;
use crate::odb::ObjectStore;
use crate::tree::Tree;
use crate::types::Oid;
use tracing::{debug, trace};

/// Merge the snapshots stored under `a` and `b`.
///
/// `base` is accepted for callers that track a common ancestor; the default
/// strategy compares the two snapshots directly and does not consult it.
pub fn merge(
    store: &dyn ObjectStore,
    base: Option<Oid>,
    a: Oid,
    b: Oid,
    force: bool,
) -> Result<Tree, OpError> {
    let tree_a = Tree::load(store, a)?;
    let tree_b = Tree::load(store, b)?;

    if let Some(base) = base {
        trace!(base = %base.short(), "merge base provided; direct two-snapshot comparison in effect");
    }

    if !force {
        let d = diff(Some(&tree_a), Some(&tree_b), store)?;
        let conflicts = d.conflicts();
        if !conflicts.is_empty() {
            return Err(OpError::Conflict(conflicts));
        }
    }

    let mut merged: Tree = tree_a.iter().map(|(k, e)| (k.clone(), *e)).collect();
    for (key, entry) in tree_b.iter() {
        merged.add(key.clone(), entry.meta, entry.kind);
    }

    debug!(
        a = %a.short(),
        b = %b.short(),
        entries = merged.len(),
        "merged trees"
    );
    Ok(merged)
}
