//! Configuration data structures.
//!
//! All structs deserialize from TOML with `#[serde(deny_unknown_fields)]` and
//! fill missing fields from [`super::defaults`].

use super::defaults;
use crate::protocol::SeatCapabilities;
use serde::Deserialize;
use std::path::PathBuf;

/// Settings for the logging subsystem, consumed by [`crate::logging::init_logging`].
///
/// ```
/// use lattice_core::config::LoggingConfig;
///
/// let config: LoggingConfig = toml::from_str("level = \"debug\"").unwrap();
/// assert_eq!(config.level, "debug");
/// assert_eq!(config.format, "text");
/// assert!(config.file_path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of "trace", "debug", "info", "warn", "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file. Relative paths are resolved against the state directory.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_log_level(),
            file_path: defaults::default_log_file_path(),
            format: defaults::default_log_format(),
        }
    }
}

/// The seat advertised by the compositor at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeatConfig {
    #[serde(default = "defaults::default_seat_name")]
    pub name: String,
    #[serde(default = "defaults::default_bool_true")]
    pub pointer: bool,
    #[serde(default = "defaults::default_bool_true")]
    pub keyboard: bool,
    #[serde(default = "defaults::default_bool_false")]
    pub touch: bool,
}

impl SeatConfig {
    /// The capability set the seat starts out with.
    pub fn initial_capabilities(&self) -> SeatCapabilities {
        let mut caps = SeatCapabilities::empty();
        caps.set(SeatCapabilities::POINTER, self.pointer);
        caps.set(SeatCapabilities::KEYBOARD, self.keyboard);
        caps.set(SeatCapabilities::TOUCH, self.touch);
        caps
    }
}

impl Default for SeatConfig {
    fn default() -> Self {
        Self {
            name: defaults::default_seat_name(),
            pointer: defaults::default_bool_true(),
            keyboard: defaults::default_bool_true(),
            touch: defaults::default_bool_false(),
        }
    }
}

/// Maximum versions advertised for each global.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    #[serde(default = "defaults::default_seat_version")]
    pub seat_version: u32,
    #[serde(default = "defaults::default_compositor_version")]
    pub compositor_version: u32,
    #[serde(default = "defaults::default_subcompositor_version")]
    pub subcompositor_version: u32,
    #[serde(default = "defaults::default_window_management_version")]
    pub window_management_version: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            seat_version: defaults::default_seat_version(),
            compositor_version: defaults::default_compositor_version(),
            subcompositor_version: defaults::default_subcompositor_version(),
            window_management_version: defaults::default_window_management_version(),
        }
    }
}

/// Per-connection resource limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    #[serde(default = "defaults::default_max_objects_per_connection")]
    pub max_objects_per_connection: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_objects_per_connection: defaults::default_max_objects_per_connection(),
        }
    }
}

/// Root configuration structure.
///
/// Every section may be omitted from the file; missing sections take their
/// `Default` value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatticeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub seat: SeatConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}
