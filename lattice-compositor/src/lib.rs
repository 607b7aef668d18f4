//! Server side of the Lattice display protocol.
//!
//! A [`Display`] owns every connection and all protocol state. The embedding
//! transport feeds it decoded [`lattice_core::protocol::ClientMessage`]s via
//! [`Display::dispatch`] and drains each connection's event receiver.

pub mod client;
pub mod display;
pub mod error;
pub mod resource;
pub mod seat;
pub mod subcompositor;
pub mod surface;
pub mod window_management;

pub use client::{ConnectionId, EventSender};
pub use display::{Display, GlobalEntry};
pub use error::DisplayError;
pub use resource::{Resource, ResourceData, ResourceId, ResourceRegistry};
pub use seat::SeatGlobal;
pub use subcompositor::{SubsurfaceError, SubsurfaceState, SubsurfaceSyncMode};
pub use surface::{CommitOutcome, Surface, SurfaceError, SurfaceKey, SurfaceState, SurfaceTree};
pub use window_management::{ManagedWindow, WindowManagementGlobal, WindowRequestEvent};
