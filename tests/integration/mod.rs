//! Integration tests for snaptree

pub mod test_utils;

mod build_workspace;
mod checkout_materialize;
mod diff_classification;
mod merge_conflicts;
mod patch_batch;
