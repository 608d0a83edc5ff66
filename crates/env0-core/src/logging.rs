//! File logging.
//!
//! The TUI owns the terminal, so log output goes to
//! `${ENV0_HOME}/logs/env0.log` through a non-blocking writer. The filter is
//! read from `ENV0_LOG` (default `info`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "ENV0_LOG";

/// Log file name inside the log directory.
pub const LOG_FILE: &str = "env0.log";

/// Installs the global tracing subscriber writing to `log_dir`.
///
/// The returned guard must be held for the lifetime of the process so
/// buffered log lines are flushed on exit.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to install log subscriber: {err}"))?;

    Ok(guard)
}
