//! Configuration loading.
//!
//! [`ConfigLoader::load()`] resolves the configuration file path, reads and
//! parses it as TOML, falls back to defaults when the file does not exist, and
//! validates the result.
//!
//! ## Configuration File Location
//!
//! 1. `$LATTICE_CONFIG`, if set.
//! 2. `config.toml` in the application config directory
//!    (e.g. `~/.config/lattice/config.toml`), resolved with `directories-next`.
//!
//! ## Validation
//!
//! Log level and format are normalized to lowercase and checked; relative log
//! file paths are made absolute against the application state directory;
//! every advertised protocol version and the object limit must be at least 1.

use crate::config::LatticeConfig;
use crate::error::{ConfigError, CoreError};
use directories_next::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "LATTICE_CONFIG";

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "Lattice";
const APPLICATION: &str = "lattice";

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates the configuration from its default location.
    ///
    /// A missing file is not an error: the default configuration is used.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DirectoryUnavailable`] if no config directory can be determined.
    /// - [`ConfigError::ReadError`] / [`ConfigError::ParseError`] for unreadable or malformed files.
    /// - [`ConfigError::ValidationError`] for out-of-range values.
    pub fn load() -> Result<LatticeConfig, CoreError> {
        let path = match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::project_dirs()?.config_dir().join("config.toml"),
        };
        Self::load_from_path(&path)
    }

    /// Loads and validates the configuration at `path`, using defaults if the file is missing.
    pub fn load_from_path(path: &Path) -> Result<LatticeConfig, CoreError> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No configuration file at {:?}, using defaults", path);
                LatticeConfig::default()
            }
            Err(source) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source,
                }
                .into())
            }
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<LatticeConfig, CoreError> {
        let mut config = Self::parse(content)?;
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<LatticeConfig, ConfigError> {
        if content.trim().is_empty() {
            return Ok(LatticeConfig::default());
        }
        Ok(toml::from_str(content)?)
    }

    fn project_dirs() -> Result<ProjectDirs, ConfigError> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| ConfigError::DirectoryUnavailable {
            dir_type: "application".to_string(),
        })
    }

    /// Validates `config` in place, normalizing values where possible.
    pub fn validate_config(config: &mut LatticeConfig) -> Result<(), CoreError> {
        let level = config.logging.level.to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => config.logging.level = level,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                ))
                .into())
            }
        }

        let format = config.logging.format.to_lowercase();
        match format.as_str() {
            "text" | "json" => config.logging.format = format,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                ))
                .into())
            }
        }

        if let Some(path) = &config.logging.file_path {
            if path.is_relative() {
                let state_dir = Self::project_dirs()?
                    .state_dir()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| env::temp_dir().join(APPLICATION));
                config.logging.file_path = Some(state_dir.join(path));
            }
        }

        if config.seat.name.trim().is_empty() {
            return Err(ConfigError::ValidationError("seat.name must not be empty.".to_string()).into());
        }

        let minimums = [
            ("protocol.seat_version", config.protocol.seat_version),
            ("protocol.compositor_version", config.protocol.compositor_version),
            ("protocol.subcompositor_version", config.protocol.subcompositor_version),
            ("protocol.window_management_version", config.protocol.window_management_version),
            ("limits.max_objects_per_connection", config.limits.max_objects_per_connection),
        ];
        for (key, value) in minimums {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!("{} must be at least 1.", key)).into());
            }
        }

        Ok(())
    }
}
