//! Client side of the Lattice display protocol.
//!
//! A [`Connection`] sends requests; an [`EventQueue`] applies the
//! compositor's events to the replicas registered on it: a [`SeatMirror`]
//! per bound seat and a [`WindowModel`] per bound window-management object.

pub mod connection;
pub mod error;
pub mod event_queue;
pub mod roles;
pub mod seat;
pub mod window_model;

pub use connection::Connection;
pub use error::ClientError;
pub use event_queue::{EventQueue, GlobalInfo};
pub use roles::{role_catalog, RoleValue, WindowIcon, WindowRole};
pub use seat::{SeatChange, SeatMirror};
pub use window_model::{ModelChange, RequestSink, WindowItem, WindowManagementProxy, WindowModel};
