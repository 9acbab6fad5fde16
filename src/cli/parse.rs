//! CLI parse: clap types for snaptree. No behavior; definitions only.

use crate::fsio::LinkType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// snaptree CLI - content-addressable directory snapshots
#[derive(Parser)]
#[command(name = "snaptree")]
#[command(about = "Content-addressable object store with a Merkle tree layer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a repository in the workspace
    Init,
    /// Compute the content digest of a file
    Hash {
        /// File to hash
        file: PathBuf,
    },
    /// Build a tree from a directory and optionally write objects
    Build {
        /// Directory (or single file) to snapshot
        path: PathBuf,
        /// Write file contents into the object store
        #[arg(long, short = 'w')]
        write: bool,
        /// Snapshot top-level subdirectories as separate tree objects
        #[arg(long)]
        shallow: bool,
    },
    /// List the entries of a tree object
    Ls {
        /// Tree oid (abbreviations accepted)
        oid: String,
        /// Tabular listing with metadata
        #[arg(long, short = 'l')]
        long: bool,
    },
    /// Show an object: tree listing or blob contents
    Show {
        /// Object oid (abbreviations accepted)
        oid: String,
    },
    /// Print the raw contents of an object
    Cat {
        /// Object oid (abbreviations accepted)
        oid: String,
        /// Verify the object hash instead of printing it
        #[arg(long, short = 'c')]
        check: bool,
    },
    /// Summarize the content size referenced by an object
    Du {
        /// Object oid (abbreviations accepted)
        oid: String,
    },
    /// Remove an object from the store
    Rm {
        /// Object oid (abbreviations accepted)
        oid: String,
    },
    /// Print the store path holding an object
    O2p {
        /// Object oid (abbreviations accepted)
        oid: String,
    },
    /// Print the oid a store path holds
    P2o {
        /// Path inside the object store
        path: PathBuf,
    },
    /// Count objects and their disk consumption
    CountObjects,
    /// Verify every object in the store
    Fsck,
    /// Diff two objects in the store
    Diff {
        /// Old-side oid
        oid1: String,
        /// New-side oid
        oid2: String,
        /// Also print unchanged entries
        #[arg(long)]
        unchanged: bool,
    },
    /// Merge two trees and write the result to the store
    Merge {
        oid1: String,
        oid2: String,
        /// Skip conflict detection; the second tree's changes win
        #[arg(long)]
        force: bool,
    },
    /// Apply a patch batch to a tree and write the result
    UpdateTree {
        /// Tree oid to edit
        oid: String,
        /// JSON patch file (ordered list of {op, path, to} records)
        #[arg(long)]
        patch_file: Option<PathBuf>,
        /// Add a local file at a tree path
        #[arg(long, num_args = 2, value_names = ["LOCAL", "DEST"], action = clap::ArgAction::Append)]
        add: Vec<String>,
        /// Remove a tree path
        #[arg(long, action = clap::ArgAction::Append)]
        remove: Vec<String>,
        /// Overwrite a tree path with a local file
        #[arg(long, num_args = 2, value_names = ["LOCAL", "DEST"], action = clap::ArgAction::Append)]
        modify: Vec<String>,
        /// Copy a tree path to another path
        #[arg(long, num_args = 2, value_names = ["SRC", "DST"], action = clap::ArgAction::Append)]
        copy: Vec<String>,
        /// Move a tree path to another path
        #[arg(long = "move", num_args = 2, value_names = ["SRC", "DST"], action = clap::ArgAction::Append)]
        mv: Vec<String>,
        /// Check that a tree path exists
        #[arg(long, action = clap::ArgAction::Append)]
        test: Vec<String>,
    },
    /// Check an object out into a path
    Checkout {
        /// Object oid (abbreviations accepted)
        oid: String,
        /// Destination path
        path: PathBuf,
        /// Replace existing files even when content matches
        #[arg(long)]
        relink: bool,
        /// Overwrite differing files without confirmation
        #[arg(long)]
        force: bool,
        /// Link strategy preference order
        #[arg(long = "type", value_enum)]
        link_types: Vec<LinkType>,
    },
}
