use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "bullet_refinery=info";

/// Initializes the logging system with console and file output.
///
/// Console output goes to stderr so that stdout carries only the JSON
/// report of each command. The file layer writes JSON lines to a daily
/// rotated `refinery.log` under `log_dir`. Keep the returned guard alive
/// until exit so buffered lines are flushed.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // Fall back to console-only logging when the directory can't be created
    if fs::create_dir_all(log_dir).is_err() {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, "refinery.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_log_dir_and_returns_guard() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let guard = init_logging(&log_dir);
        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }
}
