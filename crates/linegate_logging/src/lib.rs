//! Shared logging utilities for Linegate binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "linegate=info,linegate_reference=info,linegate_sinks=info";
const VERBOSE_LOG_FILTER: &str = "linegate=debug,linegate_reference=debug,linegate_sinks=debug";

/// Logging configuration shared by Linegate binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
}

/// Initialize tracing with a daily-rolling file writer and stderr output.
///
/// The returned guard owns the background log writer; hold it for the life
/// of the process or tail-end records are lost.
pub fn init_logging(config: LogConfig<'_>) -> Result<WorkerGuard> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let file_appender =
        tracing_appender::rolling::daily(log_dir, format!("{}.log", config.app_name));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = env_filter_or(DEFAULT_LOG_FILTER);
    let console_filter = if config.verbose {
        env_filter_or(VERBOSE_LOG_FILTER)
    } else {
        env_filter_or(DEFAULT_LOG_FILTER)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();

    Ok(guard)
}

fn env_filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Get the Linegate home directory: ~/.linegate
pub fn linegate_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("LINEGATE_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".linegate")
}

/// Get the logs directory: ~/.linegate/logs
pub fn logs_dir() -> PathBuf {
    linegate_home().join("logs")
}

/// Get the default audit stream directory: ~/.linegate/audit
pub fn audit_dir() -> PathBuf {
    linegate_home().join("audit")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}
