//! Filesystem walker for snapshot builds

use std::io;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

/// One filesystem entry found by the walk.
#[derive(Debug, Clone)]
pub enum WalkEntry {
    File { path: PathBuf, size: u64 },
    Directory { path: PathBuf },
}

impl WalkEntry {
    pub fn path(&self) -> &PathBuf {
        match self {
            WalkEntry::File { path, .. } | WalkEntry::Directory { path } => path,
        }
    }
}

/// Walk configuration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Follow symbolic links (off by default; following links makes the
    /// snapshot depend on link targets outside the root).
    pub follow_symlinks: bool,
    /// Directory or file names excluded from the snapshot.
    pub ignore: Vec<String>,
    /// Maximum traversal depth (`None` = unlimited).
    pub max_depth: Option<usize>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore: vec![".snaptree".to_string(), ".git".to_string()],
            max_depth: None,
        }
    }
}

/// Deterministic filesystem walker: output is sorted by path regardless of
/// directory read order.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Collect all entries below (not including) the root, sorted by path.
    pub fn walk(&self) -> io::Result<Vec<WalkEntry>> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX));

        for entry in walker {
            let entry = entry.map_err(io::Error::other)?;

            if self.is_ignored(&entry) {
                continue;
            }

            let path = entry.path().to_path_buf();
            if path == self.root {
                continue;
            }

            let metadata = entry.metadata().map_err(io::Error::other)?;
            if metadata.is_file() {
                entries.push(WalkEntry::File {
                    path,
                    size: metadata.len(),
                });
            } else if metadata.is_dir() {
                entries.push(WalkEntry::Directory { path });
            }
            // Symlinks fall through when not followed.
        }

        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        entry.path().components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                self.config
                    .ignore
                    .iter()
                    .any(|pattern| name.to_string_lossy() == pattern.as_str())
            } else {
                false
            }
        })
    }
}
