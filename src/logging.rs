//! Logging System
//!
//! Structured logging via the `tracing` crate. The filter comes from the
//! `SNAPTREE_LOG` environment variable when set, otherwise from the
//! configured level; output is text or JSON on stdout, or appended to a file.

use crate::error::OpError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Log file path; stdout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Colored output (text format on stdout only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            file: None,
            color: default_true(),
        }
    }
}

/// Initialize the logging system.
///
/// Priority, highest first: `SNAPTREE_LOG` environment filter, then the
/// passed configuration, then defaults.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), OpError> {
    let filter = build_env_filter(config)?;
    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(OpError::Config(format!(
            "invalid log format: {format} (must be 'json' or 'text')"
        )));
    }

    let base = Registry::default().with(filter);
    let use_color = config.map(|c| c.color).unwrap_or(true);

    match (format, config.and_then(|c| c.file.clone())) {
        ("json", Some(path)) => {
            let writer = open_log_file(&path)?;
            base.with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .init();
        }
        ("json", None) => {
            base.with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stdout),
            )
            .init();
        }
        (_, Some(path)) => {
            let writer = open_log_file(&path)?;
            base.with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
        }
        (_, None) => {
            base.with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(std::io::stdout),
            )
            .init();
        }
    }

    Ok(())
}

fn open_log_file(path: &PathBuf) -> Result<std::fs::File, OpError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| OpError::Config(format!("failed to create log directory: {e}")))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| OpError::Config(format!("failed to open log file {path:?}: {e}")))
}

fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, OpError> {
    if let Ok(filter) = EnvFilter::try_from_env("SNAPTREE_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }
    EnvFilter::try_new(level)
        .map_err(|e| OpError::Config(format!("invalid log level '{level}': {e}")))
}
