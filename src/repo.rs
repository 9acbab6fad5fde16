//! Repository discovery and layout
//!
//! A snaptree repository is any directory with a `.snaptree/` control
//! directory: objects under `.snaptree/objects`, the checkout state cache
//! under `.snaptree/state`, and the optional workspace config next to them.

use crate::error::{OpError, StoreError};
use crate::odb::{LocalObjectStore, StateCache};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONTROL_DIR: &str = ".snaptree";

#[derive(Debug, Clone)]
pub struct Repo {
    root: PathBuf,
}

impl Repo {
    /// Create the control directory layout under `path`. Re-initializing an
    /// existing repository is a no-op.
    pub fn init(path: &Path) -> Result<Self, OpError> {
        let root = path.to_path_buf();
        let control = root.join(CONTROL_DIR);
        let fresh = !control.exists();

        fs::create_dir_all(control.join("objects"))?;
        fs::create_dir_all(control.join("tmp"))?;

        if fresh {
            info!(root = %root.display(), "initialized repository");
        }
        Ok(Self { root })
    }

    /// Find the repository containing the current working directory.
    pub fn discover() -> Result<Self, OpError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` until a control directory appears.
    pub fn discover_from(start: &Path) -> Result<Self, OpError> {
        for candidate in start.ancestors() {
            if candidate.join(CONTROL_DIR).is_dir() {
                debug!(root = %candidate.display(), "discovered repository");
                return Ok(Self {
                    root: candidate.to_path_buf(),
                });
            }
        }
        Err(OpError::NotARepo(start.to_path_buf()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn control_dir(&self) -> PathBuf {
        self.root.join(CONTROL_DIR)
    }

    pub fn object_dir(&self) -> PathBuf {
        self.control_dir().join("objects")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.control_dir().join("tmp")
    }

    pub fn state_path(&self) -> PathBuf {
        self.control_dir().join("state")
    }

    pub fn config_path(&self) -> PathBuf {
        self.control_dir().join("config.toml")
    }

    pub fn odb(&self) -> Result<LocalObjectStore, StoreError> {
        LocalObjectStore::open(self.object_dir())
    }

    pub fn state(&self) -> Result<StateCache, StoreError> {
        StateCache::open(self.state_path())
    }
}
