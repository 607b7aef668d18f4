//! Default configuration values.
//!
//! Referenced by `serde`'s `default` attribute in [`super::types`], and by the
//! `Default` impls there so both paths agree.

use std::path::PathBuf;

/// Returns the default log level string (`"info"`).
pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

/// No log file by default.
pub(crate) fn default_log_file_path() -> Option<PathBuf> {
    None
}

/// Returns the default log format string (`"text"`).
pub(crate) fn default_log_format() -> String {
    "text".to_string()
}

/// Returns the default seat name (`"seat0"`).
pub(crate) fn default_seat_name() -> String {
    "seat0".to_string()
}

pub(crate) fn default_bool_true() -> bool {
    true
}

pub(crate) fn default_bool_false() -> bool {
    false
}

/// Highest seat version the compositor advertises. Version 2 added the name event.
pub(crate) fn default_seat_version() -> u32 {
    3
}

pub(crate) fn default_compositor_version() -> u32 {
    4
}

pub(crate) fn default_subcompositor_version() -> u32 {
    1
}

pub(crate) fn default_window_management_version() -> u32 {
    1
}

/// Objects a single connection may hold before further allocations fail.
pub(crate) fn default_max_objects_per_connection() -> u32 {
    4096
}
