//! Filesystem collaborator
//!
//! The narrow surface the build, patch, and checkout engines touch a real
//! filesystem through. `LocalFileSystem` is the production implementation;
//! tests drive it against tempdirs.

use crate::tree::meta::Metadata;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::trace;

/// Materialization strategies, cheapest first.
///
/// `Copy` is the universal fallback: it is the only strategy that works for
/// every (store, destination) filesystem pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Copy-on-write clone (same filesystem, CoW-capable).
    Reflink,
    /// Shared inode (same filesystem).
    Hardlink,
    /// Path reference into the object store.
    Symlink,
    /// Full byte duplication.
    Copy,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkType::Reflink => "reflink",
            LinkType::Hardlink => "hardlink",
            LinkType::Symlink => "symlink",
            LinkType::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// Filesystem operations consumed by the engines.
pub trait FileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;
    fn stat(&self, path: &Path) -> io::Result<Metadata>;
    fn exists(&self, path: &Path) -> bool;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Materialize `dst` from `src` using one strategy. A strategy the
    /// filesystem pair does not support fails with an ordinary error; the
    /// caller moves on to the next strategy in its preference list.
    fn link(&self, kind: LinkType, src: &Path, dst: &Path) -> io::Result<()>;

    /// Set permission bits where the platform supports them.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        Ok(Metadata::from_fs(&fs::metadata(path)?))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn link(&self, kind: LinkType, src: &Path, dst: &Path) -> io::Result<()> {
        trace!(kind = %kind, src = %src.display(), dst = %dst.display(), "link");
        match kind {
            LinkType::Copy => fs::copy(src, dst).map(|_| ()),
            LinkType::Hardlink => fs::hard_link(src, dst),
            LinkType::Symlink => symlink(src, dst),
            LinkType::Reflink => reflink(src, dst),
        }
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        set_mode_impl(path, mode)
    }
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(not(unix))]
fn symlink(_src: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks not supported on this platform",
    ))
}

/// Copy-on-write clone via `cp --reflink=always`.
///
/// `always` (not `auto`) is deliberate: a silent fallback to a plain copy
/// would hide the strategy that actually ran from the caller's fallback
/// chain.
fn reflink(src: &Path, dst: &Path) -> io::Result<()> {
    let status = Command::new("cp")
        .arg("--reflink=always")
        .arg(src)
        .arg(dst)
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("cp --reflink=always failed for {}", dst.display()),
        ))
    }
}

#[cfg(unix)]
fn set_mode_impl(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode_impl(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
