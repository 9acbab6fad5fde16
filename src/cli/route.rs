//! CLI routing: command execution against a repository.

use crate::checkout::{checkout, CheckoutOptions};
use crate::cli::output;
use crate::cli::parse::Commands;
use crate::config::SnaptreeConfig;
use crate::diff::diff_objects;
use crate::error::{OpError, StoreError};
use crate::fsio::LocalFileSystem;
use crate::hash;
use crate::merge::merge;
use crate::object::{load, Object};
use crate::odb::{LocalObjectStore, ObjectStore};
use crate::patch::{self, PatchOp};
use crate::repo::Repo;
use crate::tree::builder::{BuildOptions, TreeBuilder};
use crate::tree::walker::WalkerConfig;
use crate::tree::{du, Tree};
use std::path::{Path, PathBuf};
use tracing::info;

/// Execution context: the workspace the CLI was pointed at.
pub struct RunContext {
    workspace: PathBuf,
}

impl RunContext {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    pub fn execute(&self, command: &Commands) -> Result<String, OpError> {
        match command {
            Commands::Init => self.cmd_init(),
            Commands::Hash { file } => cmd_hash(file),
            Commands::Build {
                path,
                write,
                shallow,
            } => self.cmd_build(path, *write, *shallow),
            Commands::Ls { oid, long } => self.cmd_ls(oid, *long),
            Commands::Show { oid } => self.cmd_show(oid),
            Commands::Cat { oid, check } => self.cmd_cat(oid, *check),
            Commands::Du { oid } => self.cmd_du(oid),
            Commands::Rm { oid } => self.cmd_rm(oid),
            Commands::O2p { oid } => self.cmd_o2p(oid),
            Commands::P2o { path } => self.cmd_p2o(path),
            Commands::CountObjects => self.cmd_count_objects(),
            Commands::Fsck => self.cmd_fsck(),
            Commands::Diff {
                oid1,
                oid2,
                unchanged,
            } => self.cmd_diff(oid1, oid2, *unchanged),
            Commands::Merge { oid1, oid2, force } => self.cmd_merge(oid1, oid2, *force),
            Commands::UpdateTree {
                oid,
                patch_file,
                add,
                remove,
                modify,
                copy,
                mv,
                test,
            } => self.cmd_update_tree(oid, patch_file.as_deref(), add, remove, modify, copy, mv, test),
            Commands::Checkout {
                oid,
                path,
                relink,
                force,
                link_types,
            } => self.cmd_checkout(oid, path, *relink, *force, link_types),
        }
    }

    fn repo(&self) -> Result<Repo, OpError> {
        Repo::discover_from(&self.workspace)
    }

    fn open(&self) -> Result<(Repo, SnaptreeConfig, LocalObjectStore), OpError> {
        let repo = self.repo()?;
        let config = SnaptreeConfig::load(repo.root())?;
        let store = LocalObjectStore::open(config.object_dir(&repo))?;
        Ok((repo, config, store))
    }

    fn cmd_init(&self) -> Result<String, OpError> {
        let existed = self.workspace.join(crate::repo::CONTROL_DIR).is_dir();
        let repo = Repo::init(&self.workspace)?;
        if existed {
            Ok(format!(
                "Reinitialized existing repository at {}",
                repo.root().display()
            ))
        } else {
            Ok(format!(
                "Initialized repository at {}",
                repo.root().display()
            ))
        }
    }

    fn cmd_build(&self, path: &Path, write: bool, shallow: bool) -> Result<String, OpError> {
        let (_, config, store) = self.open()?;

        if path.is_file() {
            let content = std::fs::read(path)?;
            let oid = if write {
                store.add(&content)?
            } else {
                hash::hash_bytes(&content)
            };
            return Ok(format!("file {oid}"));
        }

        let walker = WalkerConfig {
            ignore: config.build.ignore.clone(),
            follow_symlinks: config.build.follow_symlinks,
            max_depth: None,
        };
        let mut tree = TreeBuilder::new(path.to_path_buf())
            .with_options(BuildOptions {
                write,
                shallow,
                walker,
            })
            .build(&store)?;

        let oid = if write {
            tree.persist(&store)?
        } else {
            tree.digest()?
        };
        Ok(format!("tree {oid} ({} entries)", tree.len()))
    }

    fn cmd_ls(&self, short: &str, long: bool) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let tree = self.load_tree(&store, short)?;
        if long {
            Ok(output::render_ls_long(&tree))
        } else {
            Ok(output::render_ls(&tree))
        }
    }

    fn cmd_show(&self, short: &str) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let oid = store.resolve_prefix(short)?;
        match load(&store, oid)? {
            Object::Tree(tree) => Ok(output::render_ls(&tree)),
            Object::Blob(oid) => {
                let bytes = store.get(&oid)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }

    fn cmd_cat(&self, short: &str, check: bool) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let oid = store.resolve_prefix(short)?;
        if check {
            store.verify(&oid, true)?;
            return Ok(format!("{oid}: ok"));
        }
        let bytes = store.get(&oid)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn cmd_du(&self, short: &str) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let oid = store.resolve_prefix(short)?;
        let total = match load(&store, oid)? {
            Object::Tree(tree) => du(&store, &tree)?,
            Object::Blob(oid) => store.get(&oid)?.len() as u64,
        };
        Ok(output::format_size(total))
    }

    fn cmd_rm(&self, short: &str) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let oid = store.resolve_prefix(short)?;
        store.remove(&oid)?;
        Ok(format!("removed {oid}"))
    }

    fn cmd_o2p(&self, short: &str) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let oid = store.resolve_prefix(short)?;
        Ok(store.oid_to_path(&oid).display().to_string())
    }

    fn cmd_p2o(&self, path: &Path) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        Ok(store.path_to_oid(path)?.to_string())
    }

    fn cmd_count_objects(&self) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let mut count = 0usize;
        let mut total = 0u64;
        for oid in store.oids()? {
            count += 1;
            if let Some(path) = store.object_path(&oid) {
                total += std::fs::metadata(path)?.len();
            }
        }
        Ok(output::render_count(count, total))
    }

    fn cmd_fsck(&self) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let oids = store.oids()?;
        let mut failures = Vec::new();
        for oid in &oids {
            if let Err(e) = store.verify(oid, true) {
                failures.push(format!("{oid}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(format!("ok: {} objects verified", oids.len()))
        } else {
            Err(OpError::Store(StoreError::ObjectFormat(format!(
                "{} corrupt objects:\n{}",
                failures.len(),
                failures.join("\n")
            ))))
        }
    }

    fn cmd_diff(&self, short1: &str, short2: &str, unchanged: bool) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let old = load(&store, store.resolve_prefix(short1)?)?;
        let new = load(&store, store.resolve_prefix(short2)?)?;
        let d = diff_objects(&old, &new, &store)?;
        Ok(output::render_diff(&d, unchanged))
    }

    fn cmd_merge(&self, short1: &str, short2: &str, force: bool) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let a = store.resolve_prefix(short1)?;
        let b = store.resolve_prefix(short2)?;
        let mut merged = merge(&store, None, a, b, force)?;
        let oid = merged.persist(&store)?;
        info!(oid = %oid.short(), "merged tree written");
        Ok(format!("tree {oid} ({} entries)", merged.len()))
    }

    #[allow(clippy::too_many_arguments)]
    fn cmd_update_tree(
        &self,
        short: &str,
        patch_file: Option<&Path>,
        add: &[String],
        remove: &[String],
        modify: &[String],
        copy: &[String],
        mv: &[String],
        test: &[String],
    ) -> Result<String, OpError> {
        let (_, _, store) = self.open()?;
        let mut tree = self.load_tree(&store, short)?;

        let mut ops = match patch_file {
            Some(path) => patch::load_patch_file(path)?,
            None => Vec::new(),
        };
        ops.extend(pairs(add).map(|(local, dest)| PatchOp::add(local, dest)));
        ops.extend(remove.iter().map(PatchOp::remove));
        ops.extend(pairs(modify).map(|(local, dest)| PatchOp::modify(local, dest)));
        ops.extend(pairs(copy).map(|(src, dst)| PatchOp::copy(src, dst)));
        ops.extend(pairs(mv).map(|(src, dst)| PatchOp::mv(src, dst)));
        ops.extend(test.iter().map(PatchOp::test));

        patch::apply(&store, &LocalFileSystem::new(), &mut tree, &ops)?;
        let oid = tree.persist(&store)?;
        Ok(format!("tree {oid} ({} entries)", tree.len()))
    }

    fn cmd_checkout(
        &self,
        short: &str,
        path: &Path,
        relink: bool,
        force: bool,
        link_types: &[crate::fsio::LinkType],
    ) -> Result<String, OpError> {
        let (repo, config, store) = self.open()?;
        let oid = store.resolve_prefix(short)?;
        let object = load(&store, oid)?;
        let state = repo.state()?;

        let link_types = if link_types.is_empty() {
            config.checkout.link_types.clone()
        } else {
            link_types.to_vec()
        };

        let prompt = |path: &Path, reason: &str| {
            dialoguer::Confirm::new()
                .with_prompt(format!("{}: {reason}. Overwrite?", path.display()))
                .default(false)
                .interact()
                .unwrap_or(false)
        };

        let options = CheckoutOptions {
            relink,
            force,
            link_types,
            prompt: Some(&prompt),
            progress: None,
            cancel: None,
            state: Some(&state),
        };

        let summary = checkout(path, &LocalFileSystem::new(), object, &store, &options)?;
        Ok(format!(
            "checked out {} entries into {} ({} up to date, {} skipped)",
            summary.completed,
            path.display(),
            summary.skipped,
            summary.denied
        ))
    }

    fn load_tree(&self, store: &LocalObjectStore, short: &str) -> Result<Tree, OpError> {
        let oid = store.resolve_prefix(short)?;
        match load(store, oid)? {
            Object::Tree(tree) => Ok(tree),
            Object::Blob(_) => Err(OpError::Store(StoreError::ObjectFormat(format!(
                "{oid} is not a tree object"
            )))),
        }
    }
}

/// Compute the content digest of a file. Requires no repository.
fn cmd_hash(file: &Path) -> Result<String, OpError> {
    let (oid, _size) = hash::hash_file(file)?;
    Ok(format!("{oid}"))
}

fn pairs(values: &[String]) -> impl Iterator<Item = (&String, &String)> {
    values.chunks(2).filter(|c| c.len() == 2).map(|c| (&c[0], &c[1]))
}
