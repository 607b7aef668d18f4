//! Inbound half of a client connection.
//!
//! The transport pushes decoded [`ServerMessage`]s into a channel; the
//! processing context owns an [`EventQueue`] and calls
//! [`EventQueue::dispatch_pending`] (or awaits [`EventQueue::dispatch`]) to
//! apply them. Each message is routed by object id to the replica registered
//! for that object.

use crate::error::ClientError;
use crate::seat::SeatMirror;
use crate::window_model::WindowModel;
use lattice_core::protocol::{Event, GlobalName, Interface, ObjectId, ServerMessage};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, trace};

/// A global as advertised by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalInfo {
    pub name: GlobalName,
    pub interface: Interface,
    pub version: u32,
}

#[derive(Debug)]
pub struct EventQueue {
    rx: UnboundedReceiver<ServerMessage>,
    globals: Vec<GlobalInfo>,
    seats: HashMap<ObjectId, SeatMirror>,
    window_models: HashMap<ObjectId, WindowModel>,
}

impl EventQueue {
    pub fn new(rx: UnboundedReceiver<ServerMessage>) -> Self {
        Self {
            rx,
            globals: Vec::new(),
            seats: HashMap::new(),
            window_models: HashMap::new(),
        }
    }

    pub fn globals(&self) -> &[GlobalInfo] {
        &self.globals
    }

    /// The first advertised global of `interface`.
    pub fn global(&self, interface: Interface) -> Option<GlobalInfo> {
        self.globals.iter().find(|g| g.interface == interface).copied()
    }

    /// Starts mirroring the seat bound as `object`.
    pub fn register_seat(&mut self, object: ObjectId) -> &mut SeatMirror {
        self.seats.entry(object).or_default()
    }

    pub fn seat(&self, object: ObjectId) -> Option<&SeatMirror> {
        self.seats.get(&object)
    }

    pub fn seat_mut(&mut self, object: ObjectId) -> Option<&mut SeatMirror> {
        self.seats.get_mut(&object)
    }

    /// Routes the window events of `object` into `model`.
    pub fn register_window_model(&mut self, object: ObjectId, model: WindowModel) -> &mut WindowModel {
        match self.window_models.entry(object) {
            Entry::Occupied(mut slot) => {
                slot.insert(model);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(model),
        }
    }

    pub fn window_model(&self, object: ObjectId) -> Option<&WindowModel> {
        self.window_models.get(&object)
    }

    pub fn window_model_mut(&mut self, object: ObjectId) -> Option<&mut WindowModel> {
        self.window_models.get_mut(&object)
    }

    /// Applies every message already queued, without waiting.
    ///
    /// Returns the number of messages applied. A protocol error from the
    /// compositor stops dispatching and is returned; the connection is dead
    /// after that.
    pub fn dispatch_pending(&mut self) -> Result<usize, ClientError> {
        let mut dispatched = 0;
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    self.route(message)?;
                    dispatched += 1;
                }
                Err(TryRecvError::Empty) => return Ok(dispatched),
                Err(TryRecvError::Disconnected) if dispatched == 0 => return Err(ClientError::Disconnected),
                Err(TryRecvError::Disconnected) => return Ok(dispatched),
            }
        }
    }

    /// Waits for at least one message, then applies everything queued.
    pub async fn dispatch(&mut self) -> Result<usize, ClientError> {
        let message = self.rx.recv().await.ok_or(ClientError::Disconnected)?;
        self.route(message)?;
        match self.dispatch_pending() {
            Ok(n) => Ok(n + 1),
            Err(ClientError::Disconnected) => Ok(1),
            Err(e) => Err(e),
        }
    }

    fn route(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        let ServerMessage { object, event } = message;
        match event {
            Event::Global { name, interface, version } => {
                debug!("Global {:?}: {} v{}", name, interface, version);
                self.globals.push(GlobalInfo { name, interface, version });
            }
            Event::Error { object, code, message } => {
                error!("Compositor reported {:?} on object {}: {}", code, object, message);
                return Err(ClientError::Protocol { object, code, message });
            }
            Event::DeleteId { id } => {
                trace!("Object {} released", id);
                self.seats.remove(&id);
                self.window_models.remove(&id);
            }
            Event::Seat(seat_event) => match self.seats.get_mut(&object) {
                Some(seat) => seat.handle_event(seat_event),
                None => trace!("Seat event for unregistered object {}: {:?}", object, seat_event),
            },
            Event::Window(window_event) => match self.window_models.get_mut(&object) {
                Some(model) => model.handle_event(window_event),
                None => trace!("Window event for unregistered object {}: {:?}", object, window_event),
            },
        }
        Ok(())
    }
}
