//! Patch batches applied end to end

use super::test_utils::{key_strings, tree_with_digests};
use snaptree::error::OpError;
use snaptree::fsio::LocalFileSystem;
use snaptree::odb::{MemoryObjectStore, ObjectStore};
use snaptree::patch::{apply, load_patch_file, PatchOp};
use snaptree::tree::key::TreeKey;
use snaptree::tree::Tree;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_add_into_empty_tree_then_duplicate_add_fails() {
    let temp_dir = TempDir::new().unwrap();
    let local = temp_dir.path().join("content");
    fs::write(&local, b"fresh content").unwrap();

    let store = MemoryObjectStore::new();
    let fs_io = LocalFileSystem::new();
    let mut tree = Tree::new();

    apply(
        &store,
        &fs_io,
        &mut tree,
        &[PatchOp::add(local.to_string_lossy(), "foo")],
    )
    .unwrap();
    assert_eq!(key_strings(&tree), vec!["foo"]);

    // A second add onto the same key fails the batch at index 0.
    let err = apply(
        &store,
        &fs_io,
        &mut tree,
        &[PatchOp::add(local.to_string_lossy(), "foo")],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        OpError::PatchFailed { index: 0, ref source, .. }
            if matches!(**source, OpError::KeyExists(_))
    ));
}

#[test]
fn test_move_relocates_entry_then_old_path_gone() {
    let store = MemoryObjectStore::new();
    let fs_io = LocalFileSystem::new();
    let mut tree = tree_with_digests(&[("a/b", 1)]);
    let original = tree.get(&TreeKey::parse("a/b")).unwrap().oid();

    apply(&store, &fs_io, &mut tree, &[PatchOp::mv("a/b", "a/c")]).unwrap();
    assert_eq!(key_strings(&tree), vec!["a/c"]);
    assert_eq!(tree.get(&TreeKey::parse("a/c")).unwrap().oid(), original);

    let err = apply(&store, &fs_io, &mut tree, &[PatchOp::test("a/b")]).unwrap_err();
    assert!(matches!(
        err,
        OpError::PatchFailed { ref source, .. } if source.is_not_found()
    ));
}

#[test]
fn test_add_then_remove_restores_entry_set() {
    let temp_dir = TempDir::new().unwrap();
    let local = temp_dir.path().join("payload");
    fs::write(&local, b"temporary").unwrap();

    let store = MemoryObjectStore::new();
    let fs_io = LocalFileSystem::new();
    let mut tree = tree_with_digests(&[("stable", 7)]);
    let before = key_strings(&tree);
    let digest_before = tree.digest().unwrap();

    apply(
        &store,
        &fs_io,
        &mut tree,
        &[
            PatchOp::add(local.to_string_lossy(), "transient"),
            PatchOp::remove("transient"),
        ],
    )
    .unwrap();

    assert_eq!(key_strings(&tree), before);
    // Entry set restored, so the recomputed digest matches; the blob the
    // add wrote stays behind in the store as garbage.
    assert_eq!(tree.digest().unwrap(), digest_before);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_batch_applies_in_order_and_stops_at_failure() {
    let store = MemoryObjectStore::new();
    let fs_io = LocalFileSystem::new();
    let mut tree = tree_with_digests(&[("one", 1), ("two", 2), ("three", 3)]);

    let ops = vec![
        PatchOp::remove("one"),
        PatchOp::test("missing"), // fails here
        PatchOp::remove("two"),   // never applied
    ];
    let err = apply(&store, &fs_io, &mut tree, &ops).unwrap_err();

    assert!(matches!(err, OpError::PatchFailed { index: 1, .. }));
    assert_eq!(key_strings(&tree), vec!["three", "two"]);
}

#[test]
fn test_copy_then_modify_diverges_copies() {
    let temp_dir = TempDir::new().unwrap();
    let v2 = temp_dir.path().join("v2");
    fs::write(&v2, b"second version").unwrap();

    let store = MemoryObjectStore::new();
    let fs_io = LocalFileSystem::new();
    let mut tree = tree_with_digests(&[("orig", 1)]);

    apply(
        &store,
        &fs_io,
        &mut tree,
        &[
            PatchOp::copy("orig", "branch"),
            PatchOp::modify(v2.to_string_lossy(), "branch"),
        ],
    )
    .unwrap();

    let orig = tree.get(&TreeKey::parse("orig")).unwrap().oid();
    let branch = tree.get(&TreeKey::parse("branch")).unwrap().oid();
    assert_ne!(orig, branch);
    assert_eq!(store.get(&branch).unwrap(), b"second version");
}

#[test]
fn test_full_cycle_from_patch_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("new-file"), b"from batch").unwrap();
    let patch_path = temp_dir.path().join("ops.json");
    fs::write(
        &patch_path,
        r#"[
            {"op": "add", "path": "new-file", "to": "added/file"},
            {"op": "copy", "path": "added/file", "to": "copied/file"},
            {"op": "move", "path": "copied/file", "to": "moved/file"},
            {"op": "test", "path": "moved/file"}
        ]"#,
    )
    .unwrap();

    let store = MemoryObjectStore::new();
    let fs_io = LocalFileSystem::new();
    let mut tree = Tree::new();

    let ops = load_patch_file(&patch_path).unwrap();
    apply(&store, &fs_io, &mut tree, &ops).unwrap();

    assert_eq!(key_strings(&tree), vec!["added/file", "moved/file"]);

    // The caller finalizes before persisting; the tree round-trips.
    let oid = tree.persist(&store).unwrap();
    let reloaded = Tree::load(&store, oid).unwrap();
    assert_eq!(reloaded, tree);
}
