//! Typed protocol messages.
//!
//! The transport (socket I/O and byte-level framing) lives outside this
//! workspace. What it hands to the compositor is a stream of
//! [`ClientMessage`]s per connection, and what it carries back is a stream of
//! [`ServerMessage`]s, both delivered reliably and in order.
//!
//! Every message is addressed to an [`ObjectId`] chosen in the connection's
//! own id space. Object `1` is the display object: global binding requests go
//! there and protocol errors come from there.

pub mod seat;
pub mod surface;
pub mod window;

use std::fmt;
use thiserror::Error;

pub use seat::{SeatCapabilities, SeatEvent, SeatRequest, SubchannelKind};
pub use surface::{
    BufferId, CompositorRequest, Rectangle, SubcompositorRequest, SubsurfaceRequest, SurfaceRequest,
};
pub use window::{WindowEvent, WindowId, WindowRequest, WindowState};

/// A per-connection object identifier. `0` is the null object and never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub const NULL: ObjectId = ObjectId(0);
    /// The display object every connection starts with.
    pub const DISPLAY: ObjectId = ObjectId(1);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric name under which a global is advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalName(pub u32);

/// The object types that can live in a connection's id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    Display,
    Seat,
    Pointer,
    Keyboard,
    Touch,
    Compositor,
    Subcompositor,
    Surface,
    Subsurface,
    WindowManagement,
}

impl Interface {
    pub fn name(&self) -> &'static str {
        match self {
            Interface::Display => "lattice_display",
            Interface::Seat => "lattice_seat",
            Interface::Pointer => "lattice_pointer",
            Interface::Keyboard => "lattice_keyboard",
            Interface::Touch => "lattice_touch",
            Interface::Compositor => "lattice_compositor",
            Interface::Subcompositor => "lattice_subcompositor",
            Interface::Surface => "lattice_surface",
            Interface::Subsurface => "lattice_subsurface",
            Interface::WindowManagement => "lattice_window_management",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error codes carried by [`Event::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request targeted an object id that does not exist on this connection.
    InvalidObject,
    /// The request is not valid for the target's interface.
    InvalidMethod,
    /// The server could not allocate the requested object.
    NoMemory,
    /// A new object id was null or already in use.
    InvalidId,
    BadSurface,
    BadParent,
    /// The surface already has a role.
    Role,
    InvalidScale,
    Implementation,
}

/// A protocol violation, posted to the offending connection as [`Event::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("object {object}: {code:?}: {message}")]
pub struct ProtocolError {
    pub object: ObjectId,
    pub code: ErrorCode,
    pub message: String,
}

impl ProtocolError {
    pub fn new(object: ObjectId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            object,
            code,
            message: message.into(),
        }
    }
}

/// A request sent by a client to one of its objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    pub object: ObjectId,
    pub request: Request,
}

impl ClientMessage {
    pub fn new(object: ObjectId, request: impl Into<Request>) -> Self {
        Self {
            object,
            request: request.into(),
        }
    }
}

/// Requests, grouped by the interface they are valid on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Display: bind global `global` at `version` into the new object `id`.
    Bind { global: GlobalName, version: u32, id: ObjectId },
    Seat(SeatRequest),
    Compositor(CompositorRequest),
    Subcompositor(SubcompositorRequest),
    Surface(SurfaceRequest),
    Subsurface(SubsurfaceRequest),
    WindowManagement(WindowRequest),
    /// Destroys a seat, sub-channel, or window-management object.
    Release,
}

impl From<SeatRequest> for Request {
    fn from(r: SeatRequest) -> Self {
        Request::Seat(r)
    }
}

impl From<CompositorRequest> for Request {
    fn from(r: CompositorRequest) -> Self {
        Request::Compositor(r)
    }
}

impl From<SubcompositorRequest> for Request {
    fn from(r: SubcompositorRequest) -> Self {
        Request::Subcompositor(r)
    }
}

impl From<SurfaceRequest> for Request {
    fn from(r: SurfaceRequest) -> Self {
        Request::Surface(r)
    }
}

impl From<SubsurfaceRequest> for Request {
    fn from(r: SubsurfaceRequest) -> Self {
        Request::Subsurface(r)
    }
}

impl From<WindowRequest> for Request {
    fn from(r: WindowRequest) -> Self {
        Request::WindowManagement(r)
    }
}

/// An event sent by the compositor from one of the client's objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage {
    pub object: ObjectId,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Display: a global is available for binding.
    Global { name: GlobalName, interface: Interface, version: u32 },
    /// Display: a fatal protocol error. The connection is closed after this event.
    Error { object: ObjectId, code: ErrorCode, message: String },
    /// Display: the object id is free for reuse by the client.
    DeleteId { id: ObjectId },
    Seat(SeatEvent),
    Window(WindowEvent),
}

impl From<SeatEvent> for Event {
    fn from(e: SeatEvent) -> Self {
        Event::Seat(e)
    }
}

impl From<WindowEvent> for Event {
    fn from(e: WindowEvent) -> Self {
        Event::Window(e)
    }
}

impl From<ProtocolError> for Event {
    fn from(e: ProtocolError) -> Self {
        Event::Error {
            object: e.object,
            code: e.code,
            message: e.message,
        }
    }
}
