//! Tracing setup for the `photomosaic` binary.
//!
//! Every run writes to stdout and to its own file
//! `<log_dir>/<unix-seconds>_photomosaic.log`. `RUST_LOG` selects the filter;
//! the default is `info`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Suffix of every per-run log file name.
pub const LOG_FILE_SUFFIX: &str = "_photomosaic.log";

/// Keeps the file writer alive; dropping it flushes the log.
pub struct LoggingGuard {
    path: PathBuf,
    _file_guard: WorkerGuard,
}

impl LoggingGuard {
    /// Path of this run's log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Per-run log file name for the given unix timestamp.
pub fn run_log_file_name(unix_seconds: u64) -> String {
    format!("{unix_seconds}{LOG_FILE_SUFFIX}")
}

/// Installs the global subscriber with stdout and file output.
///
/// # Errors
/// Returns an error when the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logging(log_dir: &Path) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let unix_seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let file_name = run_log_file_name(unix_seconds);
    let path = log_dir.join(&file_name);

    let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_names(true);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_thread_names(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|error| io::Error::other(error.to_string()))?;

    Ok(LoggingGuard {
        path,
        _file_guard: file_guard,
    })
}
