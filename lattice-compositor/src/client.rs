//! Connection bookkeeping on the compositor side.

use lattice_core::protocol::{Event, ObjectId, ServerMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn new() -> Self {
        ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Cloneable handle for queueing events to one connection.
///
/// Globals keep one of these per bound resource so they can broadcast without
/// going back through the display. Sending never blocks; if the transport side
/// has gone away the event is dropped.
#[derive(Debug, Clone)]
pub struct EventSender {
    connection: ConnectionId,
    tx: UnboundedSender<ServerMessage>,
}

impl EventSender {
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn send(&self, object: ObjectId, event: impl Into<Event>) {
        let message = ServerMessage {
            object,
            event: event.into(),
        };
        trace!(connection = %self.connection, object = %object, event = ?message.event, "queueing event");
        if self.tx.send(message).is_err() {
            debug!("Event for {} dropped: transport receiver is gone", self.connection);
        }
    }
}

/// A live client connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    sender: EventSender,
}

impl Connection {
    /// Creates a connection and the receiving end the transport drains.
    pub fn new() -> (Self, UnboundedReceiver<ServerMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        debug!("New connection {}", id);
        (
            Connection {
                id,
                sender: EventSender { connection: id, tx },
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn sender(&self) -> &EventSender {
        &self.sender
    }
}
