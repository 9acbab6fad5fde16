//! In-memory object store
//!
//! Used by tests and for objects built from streams that never touch disk.
//! Link-based checkout strategies cannot source from it (`object_path` is
//! `None`), so only the copy strategy applies.

use crate::error::StoreError;
use crate::hash;
use crate::odb::ObjectStore;
use crate::types::Oid;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<Oid, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn add(&self, content: &[u8]) -> Result<Oid, StoreError> {
        let oid = hash::hash_bytes(content);
        self.objects
            .write()
            .entry(oid)
            .or_insert_with(|| content.to_vec());
        Ok(oid)
    }

    fn get(&self, oid: &Oid) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .get(oid)
            .cloned()
            .ok_or(StoreError::ObjectNotFound(*oid))
    }

    fn exists(&self, oid: &Oid) -> bool {
        self.objects.read().contains_key(oid)
    }

    fn remove(&self, oid: &Oid) -> Result<(), StoreError> {
        self.objects
            .write()
            .remove(oid)
            .map(|_| ())
            .ok_or(StoreError::ObjectNotFound(*oid))
    }

    fn oids(&self) -> Result<Vec<Oid>, StoreError> {
        Ok(self.objects.read().keys().copied().collect())
    }

    fn verify(&self, oid: &Oid, check_hash: bool) -> Result<(), StoreError> {
        let guard = self.objects.read();
        let content = guard.get(oid).ok_or(StoreError::ObjectNotFound(*oid))?;
        if check_hash {
            let actual = hash::hash_bytes(content);
            if actual != *oid {
                return Err(StoreError::HashMismatch {
                    expected: *oid,
                    actual,
                });
            }
        }
        Ok(())
    }
}
