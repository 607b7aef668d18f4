//! Outgoing half of a client connection.

use lattice_core::protocol::{ClientMessage, GlobalName, ObjectId, Request};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Handle for sending requests to the compositor.
///
/// Cheap to clone and usable from any thread. Each request is enqueued as one
/// whole message, so requests from different threads never interleave.
#[derive(Debug, Clone)]
pub struct Connection {
    tx: UnboundedSender<ClientMessage>,
    next_id: Arc<AtomicU32>,
}

impl Connection {
    /// Creates the handle and the stream of requests the transport drains.
    pub fn new() -> (Self, UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Self {
            tx,
            // 1 is the display object.
            next_id: Arc::new(AtomicU32::new(ObjectId::DISPLAY.0 + 1)),
        };
        (connection, rx)
    }

    /// Allocates a fresh object id in this connection's id space.
    pub fn new_object_id(&self) -> ObjectId {
        ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Queues a request. Never blocks; a closed connection drops the request.
    pub fn send(&self, object: ObjectId, request: impl Into<Request>) {
        let message = ClientMessage::new(object, request);
        if let Err(e) = self.tx.send(message) {
            debug!("Dropping request for object {}: connection closed ({:?})", object, e.0.request);
        }
    }

    /// Binds `global` and returns the new object's id.
    pub fn bind(&self, global: GlobalName, version: u32) -> ObjectId {
        let id = self.new_object_id();
        self.send(ObjectId::DISPLAY, Request::Bind { global, version, id });
        id
    }
}
