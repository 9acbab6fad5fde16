//! Configuration System
//!
//! Workspace configuration lives at `.snaptree/config.toml` and is overlaid
//! with `SNAPTREE_*` environment variables. Everything has a default, so a
//! repository with no config file at all behaves sensibly.

use crate::error::OpError;
use crate::fsio::LinkType;
use crate::logging::LoggingConfig;
use crate::repo::Repo;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SnaptreeConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Object store location settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Explicit object directory, overriding the repository default.
    pub object_dir: Option<PathBuf>,

    /// Use a per-user shared object directory instead of the repository's
    /// own. Ignored when `object_dir` is set.
    #[serde(default)]
    pub shared: bool,
}

/// Checkout defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Link strategy preference order.
    #[serde(default = "default_link_types")]
    pub link_types: Vec<LinkType>,
}

fn default_link_types() -> Vec<LinkType> {
    vec![LinkType::Copy]
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            link_types: default_link_types(),
        }
    }
}

/// Build defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Names excluded from snapshot walks.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_ignore() -> Vec<String> {
    vec![".snaptree".to_string(), ".git".to_string()]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            follow_symlinks: false,
        }
    }
}

impl SnaptreeConfig {
    /// Load the configuration for a repository root.
    pub fn load(repo_root: &Path) -> Result<Self, OpError> {
        let path = repo_root
            .join(crate::repo::CONTROL_DIR)
            .join("config.toml");
        Self::load_from(&path)
    }

    /// Load from an explicit config file path (which may not exist).
    pub fn load_from(path: &Path) -> Result<Self, OpError> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("SNAPTREE").separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| OpError::Config(e.to_string()))
    }

    /// Where objects for this repository live: explicit override, the
    /// per-user shared directory, or the repository's own store.
    pub fn object_dir(&self, repo: &Repo) -> PathBuf {
        if let Some(dir) = &self.store.object_dir {
            return dir.clone();
        }
        if self.store.shared {
            if let Some(dirs) = ProjectDirs::from("", "", "snaptree") {
                return dirs.data_dir().join("objects");
            }
        }
        repo.object_dir()
    }
}
