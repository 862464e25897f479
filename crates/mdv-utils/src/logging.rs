//! # Logging Utilities
//!
//! Logging infrastructure for mdv using `tracing`.
//!
//! Two setups are provided:
//! - **One-shot mode** (`mdv dump`): logs go to stderr so stdout only carries
//!   the dump report, with an optional extra log file.
//! - **Shell mode** (`mdv shell`): logs go to a dated file only, so they never
//!   interleave with the interactive prompt.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=mdv_core=trace`)
//! - `MDV_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `MDV_LOG_FILE`: Optional path to an additional log file (one-shot mode)
//!
//! ## Example
//!
//! ```rust,no_run
//! use mdv_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! init_logging_with_level(Some(LogLevel::Debug), LogFormat::Pretty).expect("Failed to initialize logging");
//! tracing::debug!("MI traffic will be visible");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON lines
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default for one-shot mode)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Read `MDV_LOG_FORMAT`, defaulting to [`LogFormat::Pretty`].
#[must_use]
pub fn format_from_env() -> LogFormat
{
    env::var("MDV_LOG_FORMAT")
        .ok()
        .and_then(|s| LogFormat::from_str(&s).ok())
        .unwrap_or(LogFormat::Pretty)
}

/// Initialize logging from the environment only
///
/// Equivalent to `init_logging_with_level(None, format_from_env())`.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log file
/// directory cannot be created.
pub fn init_logging() -> Result<(), LoggingError>
{
    init_logging_with_level(None, format_from_env())
}

/// Initialize console logging on stderr
///
/// Filter priority:
/// 1. `level` when given (from the `--log-level` CLI flag)
/// 2. `RUST_LOG` (supports module filters like `mdv_core::host=debug`)
/// 3. `WARN`
///
/// When `MDV_LOG_FILE` is set, the same events are also written to that file
/// (daily rolling, no ANSI colours).
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log file
/// directory cannot be created.
pub fn init_logging_with_level(level: Option<LogLevel>, format: LogFormat) -> Result<(), LoggingError>
{
    let filter = build_filter(level.map(Into::into), Level::WARN);

    let mut layers: Vec<BoxedLayer> = vec![make_layer(format, io::stderr, true, filter.clone())];

    if let Some(file_path) = env::var("MDV_LOG_FILE").ok().map(PathBuf::from) {
        let (dir, name) = split_log_path(&file_path)?;
        let appender = tracing_appender::rolling::daily(dir, name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        // The process is short lived; keep the worker alive until exit.
        std::mem::forget(guard);
        layers.push(make_layer(format, non_blocking, false, filter));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

/// Initialize file-only logging for the interactive shell
///
/// The log file is `~/.mdv/YYYY-MM-DD-mdv-shell.log`, or the same name under
/// the system temp directory when `HOME` is not set. Returns the path so the
/// shell can tell the user where to look.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// cannot be created.
pub fn init_logging_for_shell(level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    let log_file = shell_log_path(env::var_os("HOME").map(PathBuf::from), &Utc::now().format("%Y-%m-%d").to_string());
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let filter = build_filter(level.map(Into::into), Level::INFO);
    let (dir, name) = split_log_path(&log_file)?;
    // Date is already in the file name.
    let appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    std::mem::forget(guard);

    Registry::default()
        .with(make_layer(format_from_env(), non_blocking, false, filter))
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;

    Ok(log_file)
}

fn shell_log_path(home: Option<PathBuf>, today: &str) -> PathBuf
{
    let dir = home.map_or_else(env::temp_dir, |home| home.join(".mdv"));
    dir.join(format!("{today}-mdv-shell.log"))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError>
{
    let name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((dir, PathBuf::from(name)))
}

fn build_filter(explicit: Option<Level>, fallback: Level) -> EnvFilter
{
    if let Some(level) = explicit {
        return EnvFilter::new(level.to_string());
    }
    match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new(fallback.to_string())),
        Err(_) => EnvFilter::new(fallback.to_string()),
    }
}

fn make_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Log file path has no file name component
    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    /// A global subscriber was already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
