//! Logging setup for Lattice.
//!
//! Everything in the workspace logs through the `tracing` facade. This module
//! installs the subscriber: a minimal stderr subscriber for tests and early
//! startup, and a configurable one (stdout plus optional rolling file, text or
//! JSON) driven by [`LoggingConfig`].

use crate::config::LoggingConfig;
use crate::error::{CoreError, LoggingError};

use once_cell::sync::Lazy;
use std::io::stdout;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the file writer alive so buffered lines get flushed.
static LOG_WORKER_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Initializes a minimal logging setup, directing messages to `stderr`.
///
/// Filters with `RUST_LOG`, falling back to `info`. Errors (e.g. a subscriber
/// is already installed) are ignored, so tests can call this freely.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

/// Maps a configured level string to a `tracing` level.
fn parse_level(level: &str) -> Result<Level, LoggingError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(LoggingError::InitializationFailure(format!(
            "Invalid log level in config: {}",
            other
        ))),
    }
}

/// Builds a per-layer filter from `tracing` directives.
fn level_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|e| LoggingError::FilterError(format!("{}: {}", directives, e)))
}

/// Creates a daily-rolling file layer and its worker guard.
fn create_file_layer(log_path: &Path, format: &str) -> Result<(BoxedLayer, WorkerGuard), CoreError> {
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !directory.exists() {
        std::fs::create_dir_all(directory).map_err(|source| CoreError::Filesystem {
            message: "Failed to create log directory".to_string(),
            path: directory.to_path_buf(),
            source,
        })?;
    }
    let file_name = log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("lattice.log"));

    let file_appender = tracing_appender::rolling::daily(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let layer = match format {
        "json" => fmt::layer().json().with_writer(writer).with_ansi(false).boxed(),
        _ => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
    };
    Ok((layer, guard))
}

/// Initializes the global logging system from a [`LoggingConfig`].
///
/// # Arguments
///
/// * `config`: the logging section of the loaded configuration.
/// * `is_reload`: when `true`, failing to replace an already installed
///   subscriber is logged instead of returned.
///
/// # Errors
///
/// Returns [`CoreError::Logging`] for an invalid level or filter, or when a subscriber is
/// already installed on first initialization, and [`CoreError::Filesystem`]
/// when the log directory cannot be created.
pub fn init_logging(config: &LoggingConfig, is_reload: bool) -> Result<(), CoreError> {
    let level = parse_level(&config.level)?;
    let format = config.format.to_lowercase();
    let directives = level.to_string();

    let stdout_layer = match format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(stdout)
            .with_ansi(false)
            .with_filter(level_filter(&directives)?)
            .boxed(),
        _ => fmt::layer()
            .with_writer(stdout)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_filter(level_filter(&directives)?)
            .boxed(),
    };

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer];
    let mut new_guard = None;
    if let Some(path) = &config.file_path {
        let (file_layer, guard) = create_file_layer(path, &format)?;
        layers.push(file_layer.with_filter(level_filter(&directives)?).boxed());
        new_guard = Some(guard);
    }

    let result = Registry::default().with(layers).try_init();

    match LOG_WORKER_GUARD.lock() {
        Ok(mut slot) => *slot = new_guard,
        Err(e) => eprintln!("[ERROR] Failed to lock LOG_WORKER_GUARD: {}. Log flushing may be affected.", e),
    }

    match result {
        Ok(()) => {
            tracing::debug!(level = %level, format = %format, "logging initialized");
            Ok(())
        }
        Err(e) if is_reload => {
            tracing::info!("Logging reload requested but a subscriber is already installed: {}", e);
            Ok(())
        }
        Err(e) => Err(LoggingError::InitializationFailure(format!(
            "Failed to set global tracing subscriber. Was it already initialized? Error: {}",
            e
        ))
        .into()),
    }
}
