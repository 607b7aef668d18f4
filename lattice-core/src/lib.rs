//! # Lattice Core Library (`lattice-core`)
//!
//! `lattice-core` is the foundation shared by the compositor side
//! (`lattice-compositor`) and the client side (`lattice-client`) of Lattice.
//!
//! ## Purpose
//!
//! - **Protocol Types**: the typed request/event catalog exchanged over a
//!   connection ([`protocol`]), including seat capabilities, surface and
//!   sub-surface requests, and the window-management event/request set.
//! - **Generational Handles**: an index arena whose keys go stale when the
//!   slot they point at is freed ([`arena`]). Every cross-object reference in
//!   the compositor is one of these handles.
//! - **Error Handling**: [`CoreError`] and its companions built on `thiserror`.
//! - **Configuration Management**: TOML configuration with defaults and
//!   validation through [`config::ConfigLoader`].
//! - **Logging**: `tracing` subscriber setup in [`logging`].
//!
//! ```rust,ignore
//! use lattice_core::config::ConfigLoader;
//! use lattice_core::logging;
//!
//! fn main() -> Result<(), lattice_core::CoreError> {
//!     let config = ConfigLoader::load()?;
//!     logging::init_logging(&config.logging, false)?;
//!     tracing::info!("seat name is {}", config.seat.name);
//!     Ok(())
//! }
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;

pub use arena::{Arena, Handle};
pub use config::{ConfigLoader, LatticeConfig};
pub use error::{ConfigError, CoreError, LoggingError};
