//! snaptree CLI binary

use anyhow::Context;
use clap::Parser;
use snaptree::cli::{map_error, Cli, RunContext};
use snaptree::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    init_logging(Some(&logging_config)).context("failed to initialize logging")?;

    info!("snaptree CLI starting");

    let context = RunContext::new(cli.workspace.clone());
    match context.execute(&cli.command) {
        Ok(output) => {
            info!("command completed");
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(e) => {
            error!("command failed: {e}");
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI arguments. Logging stays off unless
/// --verbose is passed or SNAPTREE_LOG is set; diagnostics never mix into
/// command output by default.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = LoggingConfig::default();
    if !cli.verbose && std::env::var_os("SNAPTREE_LOG").is_none() {
        config.level = "off".to_string();
        return config;
    }

    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    config
}
