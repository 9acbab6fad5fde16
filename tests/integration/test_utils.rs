//! Shared helpers for integration tests

use snaptree::odb::{MemoryObjectStore, ObjectStore};
use snaptree::tree::key::TreeKey;
use snaptree::tree::meta::Metadata;
use snaptree::tree::Tree;
use snaptree::types::{ObjectKind, Oid};

/// A tree whose file entries reference real blobs in `store`.
pub fn tree_with_blobs(store: &MemoryObjectStore, files: &[(&str, &[u8])]) -> Tree {
    let mut tree = Tree::new();
    for (path, content) in files {
        let oid = store.add(content).unwrap();
        tree.add(
            TreeKey::parse(path),
            Metadata::with_size(content.len() as u64),
            ObjectKind::File(oid),
        );
    }
    tree
}

/// A tree whose entries use synthetic digests (no backing blobs).
pub fn tree_with_digests(entries: &[(&str, u8)]) -> Tree {
    let mut tree = Tree::new();
    for (path, byte) in entries {
        tree.add(
            TreeKey::parse(path),
            Metadata::with_size(1),
            ObjectKind::File(synthetic_oid(*byte)),
        );
    }
    tree
}

pub fn synthetic_oid(byte: u8) -> Oid {
    Oid::from_bytes([byte; 32])
}

/// Persist a synthetic-digest tree and return its oid.
pub fn persist_digests(store: &MemoryObjectStore, entries: &[(&str, u8)]) -> Oid {
    tree_with_digests(entries).persist(store).unwrap()
}

/// Sorted key strings of a tree, for compact assertions.
pub fn key_strings(tree: &Tree) -> Vec<String> {
    tree.iter().map(|(k, _)| k.to_string()).collect()
}
