//! Building snapshots from real directory trees

use snaptree::diff::diff;
use snaptree::odb::MemoryObjectStore;
use snaptree::tree::builder::{BuildOptions, TreeBuilder};
use snaptree::tree::key::TreeKey;
use snaptree::tree::walker::WalkerConfig;
use snaptree::tree::Tree;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn populate(root: &Path) {
    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::write(root.join("root.txt"), b"root file").unwrap();
    fs::write(root.join("a/one.txt"), b"one").unwrap();
    fs::write(root.join("a/b/two.txt"), b"two").unwrap();
}

#[test]
fn test_build_keys_are_sorted_and_relative() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let store = MemoryObjectStore::new();
    let tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .build(&store)
        .unwrap();

    let keys: Vec<String> = tree.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["a/b/two.txt", "a/one.txt", "root.txt"]);
}

#[test]
fn test_rebuild_after_edit_diffs_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let store = MemoryObjectStore::new();
    let builder = TreeBuilder::new(temp_dir.path().to_path_buf());

    let before = builder.build(&store).unwrap();
    fs::write(temp_dir.path().join("a/one.txt"), b"one, edited").unwrap();
    fs::write(temp_dir.path().join("brand-new.txt"), b"new").unwrap();
    let after = builder.build(&store).unwrap();

    let d = diff(Some(&before), Some(&after), &store).unwrap();
    let modified: Vec<String> = d.modified.iter().map(|c| c.key().to_string()).collect();
    let added: Vec<String> = d.added.iter().map(|c| c.key().to_string()).collect();
    assert_eq!(modified, vec!["", "a/one.txt"]);
    assert_eq!(added, vec!["brand-new.txt"]);
}

#[test]
fn test_ignore_patterns_exclude_control_dirs() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());
    fs::create_dir(temp_dir.path().join(".snaptree")).unwrap();
    fs::write(temp_dir.path().join(".snaptree/objects"), b"internal").unwrap();

    let store = MemoryObjectStore::new();
    let tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .build(&store)
        .unwrap();

    assert!(tree
        .iter()
        .all(|(k, _)| !k.to_string().contains(".snaptree")));
}

#[test]
fn test_custom_ignore_list() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let store = MemoryObjectStore::new();
    let options = BuildOptions {
        walker: WalkerConfig {
            ignore: vec!["a".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    let tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .with_options(options)
        .build(&store)
        .unwrap();

    assert_eq!(tree.len(), 1);
    assert!(tree.lookup(&TreeKey::parse("root.txt")).is_some());
}

#[test]
fn test_shallow_build_diffs_against_flat_by_leaves() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let store = MemoryObjectStore::new();

    let shallow_before = TreeBuilder::new(temp_dir.path().to_path_buf())
        .with_options(BuildOptions {
            write: true,
            shallow: true,
            ..Default::default()
        })
        .build(&store)
        .unwrap();

    fs::write(temp_dir.path().join("a/b/two.txt"), b"two, edited").unwrap();

    let shallow_after = TreeBuilder::new(temp_dir.path().to_path_buf())
        .with_options(BuildOptions {
            write: true,
            shallow: true,
            ..Default::default()
        })
        .build(&store)
        .unwrap();

    // The changed leaf surfaces through the directory indirection.
    let d = diff(Some(&shallow_before), Some(&shallow_after), &store).unwrap();
    let modified: Vec<String> = d.modified.iter().map(|c| c.key().to_string()).collect();
    assert_eq!(modified, vec!["", "a/b/two.txt"]);
}

#[test]
fn test_tree_object_round_trips_through_store() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let store = MemoryObjectStore::new();
    let mut tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .with_options(BuildOptions {
            write: true,
            ..Default::default()
        })
        .build(&store)
        .unwrap();

    let oid = tree.persist(&store).unwrap();
    let loaded = Tree::load(&store, oid).unwrap();
    assert_eq!(loaded, tree);

    // Every referenced blob was written, so verification passes.
    loaded.verify(&store).unwrap();
}
