//! Structured logging to a file
//!
//! The terminal belongs to the TUI, so log lines go to
//! `<data dir>/kubegraf-tui/logs/kubegraf-tui.log` through a non-blocking
//! writer. The returned guard must live until exit so buffered lines flush.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DEFAULT_LOG_FILTER;

pub const LOG_FILE_NAME: &str = "kubegraf-tui.log";

/// Platform data directory for log files
pub fn log_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kubegraf-tui").map(|dirs| dirs.data_local_dir().join("logs"))
}

/// Parses a filter directive, falling back to the default on bad input
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber writing to `dir`
pub fn init(dir: &Path, directive: &str) -> Result<WorkerGuard, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    let (writer, guard) = non_blocking(rolling::never(dir, LOG_FILE_NAME));

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter(directive))
        .with(file_layer)
        .try_init()?;

    tracing::info!(directive, path = %dir.display(), "logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directive_falls_back() {
        let filter = env_filter("kubegraf_tui=loud");
        assert_eq!(filter.to_string(), EnvFilter::new(DEFAULT_LOG_FILTER).to_string());
    }

    #[test]
    fn test_log_dir_is_app_specific() {
        if let Some(dir) = log_dir() {
            assert!(dir.ends_with("logs"));
            assert!(dir.to_string_lossy().contains("kubegraf-tui"));
        }
    }

    #[test]
    fn test_init_writes_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init(dir.path(), "info").unwrap();
        tracing::warn!("cache warmed");
        drop(guard);

        let contents = fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert!(contents.contains("logging initialized"));
        assert!(contents.contains("cache warmed"));
    }
}
