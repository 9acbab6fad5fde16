//! Loading stored objects without knowing their kind up front
//!
//! A stored object is either a raw blob or the canonical serialization of a
//! tree. `load` distinguishes the two by attempting a verified tree parse:
//! only bytes that both parse as an entry list and re-digest to the requested
//! oid are trees.

use crate::error::StoreError;
use crate::odb::ObjectStore;
use crate::tree::Tree;
use crate::types::Oid;

/// A stored object, interpreted.
#[derive(Debug)]
pub enum Object {
    /// Raw content bytes addressed by this digest.
    Blob(Oid),
    /// A directory snapshot.
    Tree(Tree),
}

impl Object {
    pub fn oid(&self) -> Option<Oid> {
        match self {
            Object::Blob(oid) => Some(*oid),
            Object::Tree(tree) => tree.oid(),
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Object::Tree(_))
    }
}

/// Fetch and interpret the object stored under `oid`.
pub fn load(store: &dyn ObjectStore, oid: Oid) -> Result<Object, StoreError> {
    if !store.exists(&oid) {
        return Err(StoreError::ObjectNotFound(oid));
    }
    match Tree::load(store, oid) {
        Ok(tree) => Ok(Object::Tree(tree)),
        Err(StoreError::ObjectFormat(_)) | Err(StoreError::HashMismatch { .. }) => {
            Ok(Object::Blob(oid))
        }
        Err(e) => Err(e),
    }
}
