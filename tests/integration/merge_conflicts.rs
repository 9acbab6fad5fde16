//! Merge engine behavior, including the conflict/force contract

use super::test_utils::{persist_digests, synthetic_oid};
use snaptree::diff::diff;
use snaptree::error::OpError;
use snaptree::merge::merge;
use snaptree::odb::MemoryObjectStore;
use snaptree::tree::key::TreeKey;
use snaptree::tree::Tree;

#[test]
fn test_overlapping_edit_conflicts_then_forced_merge() {
    // A = {"x": d1}; B = {"x": d2, "y": d3}
    let store = MemoryObjectStore::new();
    let a = persist_digests(&store, &[("x", 1)]);
    let b = persist_digests(&store, &[("x", 2), ("y", 3)]);

    let err = merge(&store, None, a, b, false).unwrap_err();
    match err {
        OpError::Conflict(paths) => assert_eq!(paths, vec!["x".to_string()]),
        other => panic!("unexpected error: {other}"),
    }

    let forced = merge(&store, None, a, b, true).unwrap();
    assert_eq!(
        forced.get(&TreeKey::parse("x")).unwrap().oid(),
        synthetic_oid(2)
    );
    assert_eq!(
        forced.get(&TreeKey::parse("y")).unwrap().oid(),
        synthetic_oid(3)
    );
    assert_eq!(forced.len(), 2);
}

#[test]
fn test_merge_with_itself_succeeds_without_force() {
    let store = MemoryObjectStore::new();
    let a = persist_digests(&store, &[("x", 1), ("y/z", 2)]);

    let mut merged = merge(&store, None, a, a, false).unwrap();
    assert_eq!(merged.digest().unwrap(), a);
}

#[test]
fn test_conflict_iff_diff_has_non_root_modified() {
    let store = MemoryObjectStore::new();
    let a = persist_digests(&store, &[("f", 1)]);
    let b = persist_digests(&store, &[("f", 1), ("g", 2)]);

    // Same digest for "f": only additions, so no conflict.
    let tree_a = Tree::load(&store, a).unwrap();
    let tree_b = Tree::load(&store, b).unwrap();
    let d = diff(Some(&tree_a), Some(&tree_b), &store).unwrap();
    assert!(d.conflicts().is_empty());

    merge(&store, None, a, b, false).unwrap();
}

#[test]
fn test_forced_merge_never_fails_and_uses_b() {
    let store = MemoryObjectStore::new();
    let a = persist_digests(&store, &[("p", 1), ("q", 2)]);
    let b = persist_digests(&store, &[("p", 9), ("q", 8)]);

    let merged = merge(&store, None, a, b, true).unwrap();
    assert_eq!(
        merged.get(&TreeKey::parse("p")).unwrap().oid(),
        synthetic_oid(9)
    );
    assert_eq!(
        merged.get(&TreeKey::parse("q")).unwrap().oid(),
        synthetic_oid(8)
    );
}

#[test]
fn test_merged_tree_persists_and_reloads() {
    let store = MemoryObjectStore::new();
    let a = persist_digests(&store, &[("left", 1)]);
    let b = persist_digests(&store, &[("right", 2)]);

    let mut merged = merge(&store, None, a, b, false).unwrap();
    assert_eq!(merged.oid(), None);

    let oid = merged.persist(&store).unwrap();
    let reloaded = Tree::load(&store, oid).unwrap();
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_merge_missing_input_fails() {
    let store = MemoryObjectStore::new();
    let a = persist_digests(&store, &[("x", 1)]);
    let missing = synthetic_oid(0xcc);

    assert!(merge(&store, None, a, missing, false).is_err());
}
