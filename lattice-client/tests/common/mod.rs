//! In-process loopback between a compositor [`Display`] and client-side
//! connections. Requests are handed to the display synchronously, and the
//! display's events already sit in the client's queue when `dispatch`
//! returns, so one `roundtrip` observes every consequence of the requests
//! sent before it.

#![allow(dead_code)]

use lattice_client::{ClientError, Connection, EventQueue, WindowManagementProxy, WindowModel};
use lattice_compositor::{ConnectionId, Display, DisplayError};
use lattice_core::config::LatticeConfig;
use lattice_core::protocol::{ClientMessage, Interface, ObjectId};
use tokio::sync::mpsc::UnboundedReceiver;

pub fn display() -> Display {
    Display::new(&LatticeConfig::default())
}

pub struct TestClient {
    pub id: ConnectionId,
    pub connection: Connection,
    pub queue: EventQueue,
    requests: UnboundedReceiver<ClientMessage>,
}

impl TestClient {
    pub fn connect(display: &mut Display) -> Self {
        let (id, events) = display.connect();
        let (connection, requests) = Connection::new();
        let mut client = Self {
            id,
            connection,
            queue: EventQueue::new(events),
            requests,
        };
        client.queue.dispatch_pending().expect("initial globals");
        client
    }

    /// Hands every queued request to the display. Returns the errors the display reported.
    pub fn flush(&mut self, display: &mut Display) -> Vec<DisplayError> {
        let mut errors = Vec::new();
        while let Ok(message) = self.requests.try_recv() {
            if let Err(e) = display.dispatch(self.id, message) {
                errors.push(e);
            }
        }
        errors
    }

    /// Flushes requests and applies the resulting events.
    pub fn roundtrip(&mut self, display: &mut Display) -> Result<usize, ClientError> {
        let errors = self.flush(display);
        assert!(errors.is_empty(), "unexpected display errors: {:?}", errors);
        self.queue.dispatch_pending()
    }

    pub fn bind(&mut self, interface: Interface, version: u32) -> ObjectId {
        let global = self.queue.global(interface).expect("global advertised");
        self.connection.bind(global.name, version)
    }

    pub fn bind_seat(&mut self, display: &mut Display, version: u32) -> ObjectId {
        let object = self.bind(Interface::Seat, version);
        self.queue.register_seat(object);
        self.roundtrip(display).expect("seat bind");
        object
    }

    pub fn bind_window_model(&mut self, display: &mut Display) -> ObjectId {
        let object = self.bind(Interface::WindowManagement, 1);
        let proxy = WindowManagementProxy::new(self.connection.clone(), object);
        self.queue.register_window_model(object, WindowModel::new(proxy));
        self.roundtrip(display).expect("window management bind");
        object
    }

    pub fn model(&self, object: ObjectId) -> &WindowModel {
        self.queue.window_model(object).expect("window model registered")
    }

    pub fn model_mut(&mut self, object: ObjectId) -> &mut WindowModel {
        self.queue.window_model_mut(object).expect("window model registered")
    }

    pub fn send(&self, object: ObjectId, request: impl Into<lattice_core::protocol::Request>) {
        self.connection.send(object, request);
    }
}

pub fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}
