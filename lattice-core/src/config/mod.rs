//! Configuration for Lattice.
//!
//! - [`types`]: the serde-derived configuration structs ([`LatticeConfig`] and its sections).
//! - [`defaults`]: default-value functions referenced by `#[serde(default = ...)]`.
//! - [`loader`]: [`ConfigLoader`], which finds, parses and validates the TOML file.

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{LatticeConfig, LimitsConfig, LoggingConfig, ProtocolConfig, SeatConfig};
