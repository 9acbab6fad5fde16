//! Filesystem-backed object store
//!
//! Objects live at `{root}/{hex[0..2]}/{hex[2..]}`, fanning out across 256
//! subdirectories to keep directory sizes bounded. Writes go through a
//! temporary file and an atomic rename; an object that already exists is
//! never rewritten (same digest means same bytes).

use crate::error::StoreError;
use crate::hash;
use crate::odb::ObjectStore;
use crate::types::Oid;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an object with this digest is (or would be) stored at.
    pub fn oid_to_path(&self, oid: &Oid) -> PathBuf {
        let hex = oid.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    /// Inverse of `oid_to_path`, for paths inside this store.
    pub fn path_to_oid(&self, path: &Path) -> Result<Oid, StoreError> {
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|_| StoreError::ObjectFormat(format!("not a store path: {path:?}")))?;
        let mut parts = rel.iter().filter_map(|c| c.to_str());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(rest), None) => format!("{prefix}{rest}")
                .parse()
                .map_err(|_| StoreError::ObjectFormat(format!("not a store path: {path:?}"))),
            _ => Err(StoreError::ObjectFormat(format!(
                "not a store path: {path:?}"
            ))),
        }
    }
}

impl ObjectStore for LocalObjectStore {
    fn add(&self, content: &[u8]) -> Result<Oid, StoreError> {
        let oid = hash::hash_bytes(content);
        let path = self.oid_to_path(&oid);

        if path.exists() {
            trace!(oid = %oid.short(), "object already stored");
            return Ok(oid);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io(e)
        })?;

        debug!(oid = %oid.short(), size = content.len(), "stored object");
        Ok(oid)
    }

    fn get(&self, oid: &Oid) -> Result<Vec<u8>, StoreError> {
        let path = self.oid_to_path(oid);
        if !path.exists() {
            return Err(StoreError::ObjectNotFound(*oid));
        }
        Ok(fs::read(path)?)
    }

    fn exists(&self, oid: &Oid) -> bool {
        self.oid_to_path(oid).exists()
    }

    fn remove(&self, oid: &Oid) -> Result<(), StoreError> {
        let path = self.oid_to_path(oid);
        if !path.exists() {
            return Err(StoreError::ObjectNotFound(*oid));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn oids(&self) -> Result<Vec<Oid>, StoreError> {
        let mut oids = Vec::new();
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            let prefix = shard.file_name().to_string_lossy().to_string();
            for object in fs::read_dir(shard.path())? {
                let object = object?;
                let rest = object.file_name().to_string_lossy().to_string();
                // Skip interrupted writes and anything else that is not an oid.
                if let Ok(oid) = format!("{prefix}{rest}").parse::<Oid>() {
                    oids.push(oid);
                }
            }
        }
        oids.sort();
        Ok(oids)
    }

    fn verify(&self, oid: &Oid, check_hash: bool) -> Result<(), StoreError> {
        let path = self.oid_to_path(oid);
        if !path.exists() {
            return Err(StoreError::ObjectNotFound(*oid));
        }
        if check_hash {
            let (actual, _) = hash::hash_file(&path)?;
            if actual != *oid {
                return Err(StoreError::HashMismatch {
                    expected: *oid,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn object_path(&self, oid: &Oid) -> Option<PathBuf> {
        let path = self.oid_to_path(oid);
        path.exists().then_some(path)
    }
}
