//! Logging for long ingest runs.
//!
//! A pass over a planet extract runs for hours and is usually watched two
//! ways at once: a tail on the log file and the progress lines on the
//! console. [`init_logging`] wires both sinks from a [`LogConfig`]:
//! single-line compact events (an ingest log gets grepped by node id),
//! optional daily rotation for multi-day ingests, and a console layer the
//! CLI's `--quiet` flag can drop. The filter honors `RUST_LOG` and
//! defaults to INFO.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "osmstream.log";

/// Logging configuration.
///
/// # Example
///
/// ```
/// use osmstream::logging::LogConfig;
///
/// let config = LogConfig::new()
///     .with_dir("logs")
///     .with_console(false)
///     .with_daily_rotation(true);
/// assert!(!config.console());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory log files are written to
    dir: PathBuf,
    /// Log file name (rotation appends the date)
    file_name: String,
    /// Mirror events to stdout
    console: bool,
    /// Rotate the file daily instead of truncating per session
    rotate_daily: bool,
}

impl LogConfig {
    /// Create a new logging configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory log files are written to. Default: `logs`.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Set the log file name. Default: `osmstream.log`.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Enable or disable the console layer.
    ///
    /// The file layer is unconditional; turning the console off keeps
    /// stdout free for command output. Default: enabled.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Rotate the log file daily instead of truncating it per session.
    ///
    /// Per-session truncation loses history a multi-day planet ingest may
    /// still need. Default: disabled.
    pub fn with_daily_rotation(mut self, rotate: bool) -> Self {
        self.rotate_daily = rotate;
        self
    }

    /// Get the log directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the log file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether the console layer is enabled.
    pub fn console(&self) -> bool {
        self.console
    }

    /// Whether daily rotation is enabled.
    pub fn rotate_daily(&self) -> bool {
        self.rotate_daily
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            file_name: DEFAULT_LOG_FILE.to_string(),
            console: true,
            rotate_daily: false,
        }
    }
}

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system from a [`LogConfig`].
///
/// # Errors
///
/// Returns an error if the log directory cannot be created, the previous
/// session's file cannot be cleared, or a global subscriber was already
/// installed.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard, io::Error> {
    prepare_log_dir(config)?;

    let appender = if config.rotate_daily() {
        rolling::daily(config.dir(), config.file_name())
    } else {
        rolling::never(config.dir(), config.file_name())
    };
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .compact();

    let stdout_layer = config.console().then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .compact()
    });

    // Default to INFO when RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Prepares the log directory for a session.
///
/// Creates the directory and, when rotation is off, truncates the previous
/// session's file. Rotated files are left alone. Returns the session file
/// path.
fn prepare_log_dir(config: &LogConfig) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(config.dir())?;

    let path = config.dir().join(config.file_name());
    if !config.rotate_daily() {
        fs::write(&path, "")?;
    }
    Ok(path)
}
