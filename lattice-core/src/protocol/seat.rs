//! Seat messages.

use super::ObjectId;
use bitflags::bitflags;

/// First seat version that carries the [`SeatEvent::Name`] event.
pub const NAME_SINCE_VERSION: u32 = 2;

bitflags! {
    /// Input device classes a seat offers.
    ///
    /// The capabilities event always carries the full current set, never a delta.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SeatCapabilities: u32 {
        const POINTER = 1;
        const KEYBOARD = 2;
        const TOUCH = 4;
    }
}

/// The device channel requested through [`SeatRequest::BindSubchannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubchannelKind {
    Pointer,
    Keyboard,
    Touch,
}

impl SubchannelKind {
    pub fn capability(&self) -> SeatCapabilities {
        match self {
            SubchannelKind::Pointer => SeatCapabilities::POINTER,
            SubchannelKind::Keyboard => SeatCapabilities::KEYBOARD,
            SubchannelKind::Touch => SeatCapabilities::TOUCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatEvent {
    Capabilities(SeatCapabilities),
    /// Only sent to seat objects bound at [`NAME_SINCE_VERSION`] or later.
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatRequest {
    BindSubchannel { kind: SubchannelKind, id: ObjectId },
}
