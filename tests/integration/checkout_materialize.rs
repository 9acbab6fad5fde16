//! Checkout materialization against a real filesystem and store

use snaptree::checkout::{checkout, CheckoutOptions};
use snaptree::diff::diff;
use snaptree::fsio::{LinkType, LocalFileSystem};
use snaptree::object::Object;
use snaptree::odb::{LocalObjectStore, StateCache};
use snaptree::tree::builder::{BuildOptions, TreeBuilder};
use snaptree::tree::Tree;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn build_and_store(root: &Path, store: &LocalObjectStore) -> Tree {
    TreeBuilder::new(root.to_path_buf())
        .with_options(BuildOptions {
            write: true,
            ..Default::default()
        })
        .build(store)
        .unwrap()
}

fn populate_source(root: &Path) {
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::write(root.join("readme.md"), b"# readme").unwrap();
    fs::write(root.join("src/main.rs"), b"fn main() {}").unwrap();
    fs::write(root.join("src/nested/deep.txt"), b"deep content").unwrap();
}

#[test]
fn test_build_checkout_rebuild_is_lossless() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    populate_source(&source);

    let store = LocalObjectStore::open(temp_dir.path().join("objects")).unwrap();
    let tree = build_and_store(&source, &store);

    let dest = temp_dir.path().join("restored");
    checkout(
        &dest,
        &LocalFileSystem::new(),
        Object::Tree(tree.clone()),
        &store,
        &CheckoutOptions::default(),
    )
    .unwrap();

    // Rebuilding the checkout yields a structurally identical tree.
    let rebuilt = build_and_store(&dest, &store);
    let d = diff(Some(&tree), Some(&rebuilt), &store).unwrap();
    assert_eq!(d.change_count(), 0);
}

#[test]
fn test_checkout_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    populate_source(&source);

    let store = LocalObjectStore::open(temp_dir.path().join("objects")).unwrap();
    let tree = build_and_store(&source, &store);
    let total_leaves = tree.len();

    let dest = temp_dir.path().join("out");
    let opts = CheckoutOptions::default();
    let fs_io = LocalFileSystem::new();

    let first = checkout(&dest, &fs_io, Object::Tree(tree.clone()), &store, &opts).unwrap();
    assert_eq!(first.materialized, total_leaves);

    let second = checkout(&dest, &fs_io, Object::Tree(tree), &store, &opts).unwrap();
    assert_eq!(second.skipped, second.completed);
    assert_eq!(second.skipped, total_leaves);
    assert_eq!(second.materialized, 0);
}

#[test]
fn test_state_cache_survives_between_runs() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    populate_source(&source);

    let store = LocalObjectStore::open(temp_dir.path().join("objects")).unwrap();
    let tree = build_and_store(&source, &store);
    let state = StateCache::open(temp_dir.path().join("state")).unwrap();

    let dest = temp_dir.path().join("out");
    let fs_io = LocalFileSystem::new();
    let opts = CheckoutOptions {
        state: Some(&state),
        ..Default::default()
    };

    checkout(&dest, &fs_io, Object::Tree(tree.clone()), &store, &opts).unwrap();
    let second = checkout(&dest, &fs_io, Object::Tree(tree), &store, &opts).unwrap();
    assert_eq!(second.skipped, second.completed);
}

#[test]
fn test_link_strategy_falls_back_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("f"), b"linked content").unwrap();

    let store = LocalObjectStore::open(temp_dir.path().join("objects")).unwrap();
    let tree = build_and_store(&source, &store);

    // Reflink is unlikely to be supported on the test filesystem; the chain
    // must quietly fall through to hardlink or copy rather than fail.
    let dest = temp_dir.path().join("out");
    let summary = checkout(
        &dest,
        &LocalFileSystem::new(),
        Object::Tree(tree),
        &store,
        &CheckoutOptions {
            link_types: vec![LinkType::Reflink, LinkType::Hardlink, LinkType::Copy],
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(summary.materialized, 1);
    assert_eq!(fs::read(dest.join("f")).unwrap(), b"linked content");
}

#[test]
fn test_modified_source_requires_force() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("f"), b"original").unwrap();

    let store = LocalObjectStore::open(temp_dir.path().join("objects")).unwrap();
    let tree = build_and_store(&source, &store);

    let dest = temp_dir.path().join("out");
    let fs_io = LocalFileSystem::new();
    checkout(
        &dest,
        &fs_io,
        Object::Tree(tree.clone()),
        &store,
        &CheckoutOptions::default(),
    )
    .unwrap();

    // Local edit in the destination.
    fs::write(dest.join("f"), b"locally edited").unwrap();

    // Without force (and no prompt), the edit survives.
    let denied = checkout(
        &dest,
        &fs_io,
        Object::Tree(tree.clone()),
        &store,
        &CheckoutOptions::default(),
    )
    .unwrap();
    assert_eq!(denied.denied, 1);
    assert_eq!(fs::read(dest.join("f")).unwrap(), b"locally edited");

    // With force, the store content wins.
    let forced = checkout(
        &dest,
        &fs_io,
        Object::Tree(tree),
        &store,
        &CheckoutOptions {
            force: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(forced.materialized, 1);
    assert_eq!(fs::read(dest.join("f")).unwrap(), b"original");
}

#[test]
fn test_checkout_shallow_tree_descends_subtrees() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    populate_source(&source);

    let store = LocalObjectStore::open(temp_dir.path().join("objects")).unwrap();
    let tree = TreeBuilder::new(source.clone())
        .with_options(BuildOptions {
            write: true,
            shallow: true,
            ..Default::default()
        })
        .build(&store)
        .unwrap();

    let dest = temp_dir.path().join("out");
    checkout(
        &dest,
        &LocalFileSystem::new(),
        Object::Tree(tree),
        &store,
        &CheckoutOptions::default(),
    )
    .unwrap();

    assert_eq!(
        fs::read(dest.join("src/nested/deep.txt")).unwrap(),
        b"deep content"
    );
    assert_eq!(fs::read(dest.join("readme.md")).unwrap(), b"# readme");
}
