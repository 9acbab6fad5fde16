//! Diff engine classification behavior

use super::test_utils::{synthetic_oid, tree_with_digests};
use snaptree::diff::{diff, diff_objects};
use snaptree::object::Object;
use snaptree::odb::{MemoryObjectStore, ObjectStore};
use snaptree::tree::key::TreeKey;
use snaptree::tree::meta::Metadata;
use snaptree::tree::Tree;
use snaptree::types::ObjectKind;

fn keys(changes: &[snaptree::diff::Change]) -> Vec<String> {
    changes.iter().map(|c| c.key().to_string()).collect()
}

#[test]
fn test_modified_and_added_paths_classified() {
    // A = {"x": d1}; B = {"x": d2, "y": d3}
    let store = MemoryObjectStore::new();
    let a = tree_with_digests(&[("x", 1)]);
    let b = tree_with_digests(&[("x", 2), ("y", 3)]);

    let d = diff(Some(&a), Some(&b), &store).unwrap();
    assert_eq!(keys(&d.added), vec!["y"]);
    assert!(d.deleted.is_empty());
    // Root digest changes alongside x.
    assert_eq!(keys(&d.modified), vec!["", "x"]);
}

#[test]
fn test_self_diff_has_no_changes() {
    let store = MemoryObjectStore::new();
    let tree = tree_with_digests(&[("a", 1), ("b/c", 2), ("b/d", 3)]);

    let d = diff(Some(&tree), Some(&tree), &store).unwrap();
    assert_eq!(d.change_count(), 0);
    assert_eq!(d.unchanged.len(), 4); // three entries + root
}

#[test]
fn test_classification_symmetry() {
    let store = MemoryObjectStore::new();
    let a = tree_with_digests(&[("shared", 1), ("gone", 2), ("edit", 3)]);
    let b = tree_with_digests(&[("shared", 1), ("new", 4), ("edit", 5)]);

    let forward = diff(Some(&a), Some(&b), &store).unwrap();
    let backward = diff(Some(&b), Some(&a), &store).unwrap();

    assert_eq!(keys(&forward.added), keys(&backward.deleted));
    assert_eq!(keys(&forward.deleted), keys(&backward.added));
    assert_eq!(keys(&forward.modified), keys(&backward.modified));
    assert_eq!(keys(&forward.unchanged), keys(&backward.unchanged));

    for (f, b) in forward.added.iter().zip(backward.deleted.iter()) {
        assert_eq!(f.new, b.old);
    }
}

#[test]
fn test_missing_side_treated_as_empty() {
    let store = MemoryObjectStore::new();
    let tree = tree_with_digests(&[("a", 1)]);

    let added = diff(None, Some(&tree), &store).unwrap();
    assert!(added.deleted.is_empty());
    assert_eq!(keys(&added.added), vec!["", "a"]);

    let deleted = diff(Some(&tree), None, &store).unwrap();
    assert!(deleted.added.is_empty());
    assert_eq!(keys(&deleted.deleted), vec!["", "a"]);
}

#[test]
fn test_in_cache_reflects_store_contents() {
    let store = MemoryObjectStore::new();
    let stored = store.add(b"present bytes").unwrap();

    let mut tree = Tree::new();
    tree.add(
        TreeKey::parse("present"),
        Metadata::with_size(13),
        ObjectKind::File(stored),
    );
    tree.add(
        TreeKey::parse("absent"),
        Metadata::with_size(1),
        ObjectKind::File(synthetic_oid(0x42)),
    );

    let d = diff(Some(&tree), Some(&tree), &store).unwrap();
    for change in &d.unchanged {
        let entry = change.new.as_ref().unwrap();
        match entry.key.to_string().as_str() {
            "present" => assert!(entry.in_cache),
            "absent" => assert!(!entry.in_cache),
            _ => {}
        }
    }
}

#[test]
fn test_nested_directory_changes_surface_as_leaves() {
    let store = MemoryObjectStore::new();

    let mut old_inner = tree_with_digests(&[("deep.txt", 1)]);
    let old_inner_oid = old_inner.persist(&store).unwrap();
    let mut new_inner = tree_with_digests(&[("deep.txt", 2)]);
    let new_inner_oid = new_inner.persist(&store).unwrap();

    // Two levels of directory indirection around the changed leaf.
    let mut old_mid = Tree::new();
    old_mid.add(
        TreeKey::parse("inner"),
        Metadata::default(),
        ObjectKind::Directory(old_inner_oid),
    );
    let old_mid_oid = old_mid.persist(&store).unwrap();

    let mut new_mid = Tree::new();
    new_mid.add(
        TreeKey::parse("inner"),
        Metadata::default(),
        ObjectKind::Directory(new_inner_oid),
    );
    let new_mid_oid = new_mid.persist(&store).unwrap();

    let mut old = Tree::new();
    old.add(
        TreeKey::parse("top"),
        Metadata::default(),
        ObjectKind::Directory(old_mid_oid),
    );
    let mut new = Tree::new();
    new.add(
        TreeKey::parse("top"),
        Metadata::default(),
        ObjectKind::Directory(new_mid_oid),
    );

    let d = diff(Some(&old), Some(&new), &store).unwrap();
    assert_eq!(keys(&d.modified), vec!["", "top/inner/deep.txt"]);
}

#[test]
fn test_blob_objects_diff_at_root() {
    let store = MemoryObjectStore::new();
    let a = store.add(b"first").unwrap();
    let b = store.add(b"second").unwrap();

    let d = diff_objects(&Object::Blob(a), &Object::Blob(b), &store).unwrap();
    assert_eq!(d.modified.len(), 1);
    assert!(d.modified[0].key().is_root());
    assert_eq!(d.modified[0].old.as_ref().unwrap().oid, a);
    assert_eq!(d.modified[0].new.as_ref().unwrap().oid, b);

    let same = diff_objects(&Object::Blob(a), &Object::Blob(a), &store).unwrap();
    assert_eq!(same.change_count(), 0);
}
