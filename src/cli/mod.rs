//! Command-line interface
//!
//! Split the way the library's other subsystems are: `parse` holds the clap
//! definitions, `route` executes commands against a repository, `output`
//! renders results for humans.

pub mod output;
pub mod parse;
pub mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use route::RunContext;
