//! Error handling for the Lattice core layer.
//!
//! The main error type for this crate is [`CoreError`], which wraps the more
//! specific [`ConfigError`] and [`LoggingError`]. Protocol-level errors that
//! are posted to a client live in [`crate::protocol::ProtocolError`] instead,
//! since they travel over the wire rather than up a call stack.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Lattice.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors that occur while the logging system is being set up.
    #[error("Logging Initialization Failed: {0}")]
    Logging(#[from] LoggingError),

    /// Filesystem operations that are not covered by the configuration errors.
    #[error("Filesystem Error: {message} (Path: {path:?})")]
    Filesystem {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Error type for configuration-related operations.
///
/// Typically wrapped by [`CoreError::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An error occurred while attempting to read a configuration file.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration parsed, but one of its values is out of range.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A required base directory (e.g. XDG config home) could not be determined.
    #[error("Could not determine base directory for {dir_type}")]
    DirectoryUnavailable { dir_type: String },
}

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The global subscriber could not be installed, or the config asked for
    /// something the logging layer cannot provide.
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    /// A filter directive could not be parsed.
    #[error("Failed to set log filter: {0}")]
    FilterError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::ErrorKind;

    #[test]
    fn test_core_error_config_variant() {
        let core_err = CoreError::from(ConfigError::ValidationError("bad level".to_string()));
        assert_eq!(
            format!("{}", core_err),
            "Configuration Error: Configuration validation failed: bad level"
        );
        assert!(core_err.source().is_some());
    }

    #[test]
    fn test_config_read_error_keeps_io_source() {
        let err = ConfigError::ReadError {
            path: PathBuf::from("/etc/lattice/config.toml"),
            source: io::Error::new(ErrorKind::PermissionDenied, "denied"),
        };
        assert!(format!("{}", err).contains("/etc/lattice/config.toml"));
        let source = err.source().expect("read error should carry its io::Error");
        assert_eq!(source.to_string(), "denied");
    }

    #[test]
    fn test_logging_error_wraps_into_core_error() {
        let core_err: CoreError = LoggingError::FilterError("x=?".to_string()).into();
        assert!(matches!(core_err, CoreError::Logging(LoggingError::FilterError(_))));
    }

    #[test]
    fn test_filesystem_error_display() {
        let err = CoreError::Filesystem {
            message: "cannot create log directory".to_string(),
            path: PathBuf::from("/var/log/lattice"),
            source: io::Error::new(ErrorKind::Other, "boom"),
        };
        assert_eq!(
            format!("{}", err),
            "Filesystem Error: cannot create log directory (Path: \"/var/log/lattice\")"
        );
    }
}
