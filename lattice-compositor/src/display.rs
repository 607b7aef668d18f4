//! The display: the single dispatch context of the compositor.
//!
//! All compositor state (connections, resources, the globals and the surface
//! tree) is owned by one [`Display`] and mutated only through `&mut self`, so
//! requests from all connections are applied one at a time, in the order the
//! transport hands them over. Events produced while handling a request are
//! queued to their connections before `dispatch` returns.

use crate::client::{Connection, ConnectionId};
use crate::error::DisplayError;
use crate::resource::{ResourceData, ResourceId, ResourceRegistry};
use crate::seat::SeatGlobal;
use crate::subcompositor::{self, SubsurfaceError, SubsurfaceSyncMode};
use crate::surface::{SurfaceError, SurfaceKey, SurfaceTree};
use crate::window_management::WindowManagementGlobal;
use lattice_core::config::LatticeConfig;
use lattice_core::protocol::{
    ClientMessage, CompositorRequest, ErrorCode, Event, GlobalName, Interface, ObjectId, ProtocolError, Request,
    SeatRequest, ServerMessage, SubchannelKind, SubcompositorRequest, SubsurfaceRequest, SurfaceRequest,
};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace, warn};

/// An advertised global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalEntry {
    pub name: GlobalName,
    pub interface: Interface,
    /// Highest version the compositor supports.
    pub version: u32,
}

#[derive(Debug)]
pub struct Display {
    connections: HashMap<ConnectionId, Connection>,
    registry: ResourceRegistry,
    globals: Vec<GlobalEntry>,
    seat: SeatGlobal,
    surfaces: SurfaceTree,
    window_management: WindowManagementGlobal,
}

impl Display {
    pub fn new(config: &LatticeConfig) -> Self {
        let protocol = &config.protocol;
        let seat = SeatGlobal::new(
            config.seat.name.clone(),
            config.seat.initial_capabilities(),
            protocol.seat_version,
        );
        let window_management = WindowManagementGlobal::new(protocol.window_management_version);
        let globals = vec![
            GlobalEntry {
                name: GlobalName(1),
                interface: Interface::Seat,
                version: seat.max_version(),
            },
            GlobalEntry {
                name: GlobalName(2),
                interface: Interface::Compositor,
                version: protocol.compositor_version,
            },
            GlobalEntry {
                name: GlobalName(3),
                interface: Interface::Subcompositor,
                version: protocol.subcompositor_version,
            },
            GlobalEntry {
                name: GlobalName(4),
                interface: Interface::WindowManagement,
                version: window_management.max_version(),
            },
        ];
        info!(
            "Display created: seat '{}' with {:?}, {} globals",
            config.seat.name,
            config.seat.initial_capabilities(),
            globals.len()
        );
        Self {
            connections: HashMap::new(),
            registry: ResourceRegistry::new(config.limits.max_objects_per_connection),
            globals,
            seat,
            surfaces: SurfaceTree::new(),
            window_management,
        }
    }

    pub fn globals(&self) -> &[GlobalEntry] {
        &self.globals
    }

    pub fn seat(&self) -> &SeatGlobal {
        &self.seat
    }

    pub fn seat_mut(&mut self) -> &mut SeatGlobal {
        &mut self.seat
    }

    pub fn surfaces(&self) -> &SurfaceTree {
        &self.surfaces
    }

    pub fn window_management(&self) -> &WindowManagementGlobal {
        &self.window_management
    }

    pub fn window_management_mut(&mut self) -> &mut WindowManagementGlobal {
        &mut self.window_management
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn is_connected(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(&connection)
    }

    /// The surface behind `object` on `connection`, if it is a surface object.
    pub fn surface_key(&self, connection: ConnectionId, object: ObjectId) -> Option<SurfaceKey> {
        match self.registry.lookup(connection, object)?.1.data {
            ResourceData::Surface(key) => Some(key),
            _ => None,
        }
    }

    /// Registers a new connection and advertises the globals to it.
    ///
    /// The returned receiver is the connection's outgoing event stream.
    pub fn connect(&mut self) -> (ConnectionId, UnboundedReceiver<ServerMessage>) {
        let (connection, rx) = Connection::new();
        let id = connection.id();
        for global in &self.globals {
            connection.sender().send(
                ObjectId::DISPLAY,
                Event::Global {
                    name: global.name,
                    interface: global.interface,
                    version: global.version,
                },
            );
        }
        self.connections.insert(id, connection);
        info!("{} connected", id);
        (id, rx)
    }

    /// Tears down everything `connection` owns. Unknown connections are ignored.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        if self.connections.remove(&connection).is_none() {
            return;
        }
        let resources = self.registry.connection_resources(connection);
        let count = resources.len();
        for resource in resources {
            self.destroy_resource(resource);
        }
        self.registry.remove_connection(connection);
        // The tree must not outlive its owner.
        for key in self.surfaces.owned_by(connection) {
            self.surfaces.destroy(key);
        }
        info!("{} disconnected, {} resources released", connection, count);
    }

    /// Handles one request from `connection`.
    ///
    /// A protocol violation is posted to the connection as an error event and
    /// the connection is torn down; the error is also returned. Other
    /// connections are not affected.
    pub fn dispatch(&mut self, connection: ConnectionId, message: ClientMessage) -> Result<(), DisplayError> {
        if !self.is_connected(connection) {
            return Err(DisplayError::UnknownConnection(connection));
        }
        trace!("{} -> object {}: {:?}", connection, message.object, message.request);
        match self.handle(connection, message) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.post_error(connection, error.clone());
                Err(DisplayError::Protocol {
                    connection,
                    source: error,
                })
            }
        }
    }

    fn post_error(&mut self, connection: ConnectionId, error: ProtocolError) {
        warn!("Protocol error on {}: {}", connection, error);
        if let Some(conn) = self.connections.get(&connection) {
            conn.sender().send(ObjectId::DISPLAY, error);
        }
        self.disconnect(connection);
    }

    fn handle(&mut self, connection: ConnectionId, message: ClientMessage) -> Result<(), ProtocolError> {
        let ClientMessage { object, request } = message;

        if object == ObjectId::DISPLAY {
            return match request {
                Request::Bind { global, version, id } => self.bind(connection, global, version, id),
                other => Err(invalid_method(object, &other)),
            };
        }

        let (resource_id, resource) = self
            .registry
            .lookup(connection, object)
            .ok_or_else(|| ProtocolError::new(object, ErrorCode::InvalidObject, format!("unknown object {}", object)))?;
        let data = resource.data;
        let version = resource.version;

        match (data, request) {
            (ResourceData::Seat, Request::Seat(SeatRequest::BindSubchannel { kind, id })) => {
                let interface = match kind {
                    SubchannelKind::Pointer => Interface::Pointer,
                    SubchannelKind::Keyboard => Interface::Keyboard,
                    SubchannelKind::Touch => Interface::Touch,
                };
                let sub = self
                    .registry
                    .create(connection, id, interface, version, ResourceData::Subchannel(kind))?;
                self.seat.add_subchannel(sub, kind);
                Ok(())
            }
            (ResourceData::Compositor, Request::Compositor(CompositorRequest::CreateSurface { id })) => {
                let key = self
                    .surfaces
                    .create(connection)
                    .ok_or_else(|| ProtocolError::new(ObjectId::DISPLAY, ErrorCode::NoMemory, "surface space exhausted"))?;
                if let Err(e) = self
                    .registry
                    .create(connection, id, Interface::Surface, version, ResourceData::Surface(key))
                {
                    self.surfaces.destroy(key);
                    return Err(e);
                }
                Ok(())
            }
            (
                ResourceData::Subcompositor,
                Request::Subcompositor(SubcompositorRequest::GetSubsurface { id, surface, parent }),
            ) => self.get_subsurface(connection, object, version, id, surface, parent),
            (ResourceData::Surface(key), Request::Surface(request)) => {
                self.handle_surface(resource_id, object, key, request)
            }
            (ResourceData::Subsurface(key), Request::Subsurface(request)) => {
                self.handle_subsurface(connection, resource_id, object, key, request)
            }
            (ResourceData::WindowManagement, Request::WindowManagement(request)) => {
                self.window_management.handle_request(connection, request);
                Ok(())
            }
            (
                ResourceData::Seat
                | ResourceData::Subchannel(_)
                | ResourceData::Compositor
                | ResourceData::Subcompositor
                | ResourceData::WindowManagement,
                Request::Release,
            ) => {
                self.release(resource_id);
                Ok(())
            }
            (_, other) => Err(invalid_method(object, &other)),
        }
    }

    fn bind(
        &mut self,
        connection: ConnectionId,
        global: GlobalName,
        requested: u32,
        id: ObjectId,
    ) -> Result<(), ProtocolError> {
        let entry = self
            .globals
            .iter()
            .find(|g| g.name == global)
            .copied()
            .ok_or_else(|| {
                ProtocolError::new(ObjectId::DISPLAY, ErrorCode::InvalidObject, format!("no global {:?}", global))
            })?;
        let version = requested.min(entry.version);
        let data = match entry.interface {
            Interface::Seat => ResourceData::Seat,
            Interface::Compositor => ResourceData::Compositor,
            Interface::Subcompositor => ResourceData::Subcompositor,
            Interface::WindowManagement => ResourceData::WindowManagement,
            other => {
                return Err(ProtocolError::new(
                    ObjectId::DISPLAY,
                    ErrorCode::Implementation,
                    format!("{} is not a global interface", other),
                ))
            }
        };

        let resource = self.registry.create(connection, id, entry.interface, version, data)?;
        let Some(sender) = self.connections.get(&connection).map(|c| c.sender().clone()) else {
            return Ok(());
        };
        debug!(
            "{} bound {} (requested v{}, negotiated v{})",
            connection, entry.interface, requested, version
        );
        match data {
            ResourceData::Seat => self.seat.bind(resource, id, version, sender),
            ResourceData::WindowManagement => self.window_management.bind(resource, id, version, sender),
            _ => {}
        }
        Ok(())
    }

    fn resolve_surface(
        &self,
        connection: ConnectionId,
        object: ObjectId,
        error: SubsurfaceError,
    ) -> Result<SurfaceKey, ProtocolError> {
        self.surface_key(connection, object)
            .ok_or_else(|| ProtocolError::new(object, error.code(), error.to_string()))
    }

    fn get_subsurface(
        &mut self,
        connection: ConnectionId,
        subcompositor: ObjectId,
        version: u32,
        id: ObjectId,
        surface: ObjectId,
        parent: ObjectId,
    ) -> Result<(), ProtocolError> {
        let surface_key = self.resolve_surface(connection, surface, SubsurfaceError::BadSurface)?;
        let parent_key = self.resolve_surface(connection, parent, SubsurfaceError::BadParent)?;

        subcompositor::get_subsurface(&mut self.surfaces, surface_key, parent_key)
            .map_err(|e| ProtocolError::new(subcompositor, e.code(), e.to_string()))?;

        if let Err(e) = self.registry.create(
            connection,
            id,
            Interface::Subsurface,
            version,
            ResourceData::Subsurface(surface_key),
        ) {
            subcompositor::destroy_subsurface_role(&mut self.surfaces, surface_key);
            return Err(e);
        }
        Ok(())
    }

    fn handle_surface(
        &mut self,
        resource: ResourceId,
        object: ObjectId,
        key: SurfaceKey,
        request: SurfaceRequest,
    ) -> Result<(), ProtocolError> {
        let result = match request {
            SurfaceRequest::Attach { buffer } => self.surfaces.attach(key, buffer),
            SurfaceRequest::Damage(rect) => self.surfaces.damage(key, rect),
            SurfaceRequest::SetBufferScale(scale) => self.surfaces.set_buffer_scale(key, scale),
            SurfaceRequest::Commit => self.surfaces.commit(key).map(|outcome| {
                trace!("Surface {:?} commit: {:?}", key, outcome);
            }),
            SurfaceRequest::Destroy => {
                self.release(resource);
                Ok(())
            }
        };
        result.map_err(|e| match e {
            SurfaceError::InvalidScale(_) => ProtocolError::new(object, ErrorCode::InvalidScale, e.to_string()),
            SurfaceError::NoSuchSurface => ProtocolError::new(object, ErrorCode::InvalidObject, e.to_string()),
        })
    }

    fn handle_subsurface(
        &mut self,
        connection: ConnectionId,
        resource: ResourceId,
        object: ObjectId,
        key: SurfaceKey,
        request: SubsurfaceRequest,
    ) -> Result<(), ProtocolError> {
        if self.surfaces.get(key).is_none() && request != SubsurfaceRequest::Destroy {
            // The surface went away first; the association is inert.
            debug!("Ignoring {:?} on inert sub-surface object {}", request, object);
            return Ok(());
        }
        let result = match request {
            SubsurfaceRequest::SetPosition { x, y } => subcompositor::set_position(&mut self.surfaces, key, x, y),
            SubsurfaceRequest::PlaceAbove { sibling } => {
                let sibling = self.resolve_surface(connection, sibling, SubsurfaceError::BadSurface)?;
                subcompositor::place_above(&mut self.surfaces, key, sibling)
            }
            SubsurfaceRequest::PlaceBelow { sibling } => {
                let sibling = self.resolve_surface(connection, sibling, SubsurfaceError::BadSurface)?;
                subcompositor::place_below(&mut self.surfaces, key, sibling)
            }
            SubsurfaceRequest::SetSync => {
                subcompositor::set_sync_mode(&mut self.surfaces, key, SubsurfaceSyncMode::Synchronized)
            }
            SubsurfaceRequest::SetDesync => {
                subcompositor::set_sync_mode(&mut self.surfaces, key, SubsurfaceSyncMode::Desynchronized)
            }
            SubsurfaceRequest::Destroy => {
                self.release(resource);
                Ok(())
            }
        };
        result.map_err(|e| ProtocolError::new(object, e.code(), e.to_string()))
    }

    /// Destroys a resource on the client's request and frees its id.
    fn release(&mut self, resource: ResourceId) {
        if let Some((connection, object)) = self.destroy_resource(resource) {
            if let Some(conn) = self.connections.get(&connection) {
                conn.sender().send(ObjectId::DISPLAY, Event::DeleteId { id: object });
            }
        }
    }

    /// Removes a resource and undoes whatever it was bound to. Idempotent.
    fn destroy_resource(&mut self, resource: ResourceId) -> Option<(ConnectionId, ObjectId)> {
        let removed = self.registry.destroy(resource)?;
        match removed.data {
            ResourceData::Seat => {
                self.seat.unbind(resource);
            }
            ResourceData::Subchannel(_) => {
                self.seat.remove_subchannel(resource);
            }
            ResourceData::WindowManagement => {
                self.window_management.unbind(resource);
            }
            ResourceData::Surface(key) => {
                self.surfaces.destroy(key);
            }
            ResourceData::Subsurface(key) => {
                subcompositor::destroy_subsurface_role(&mut self.surfaces, key);
            }
            ResourceData::Compositor | ResourceData::Subcompositor => {}
        }
        Some((removed.connection, removed.object))
    }
}

fn invalid_method(object: ObjectId, request: &Request) -> ProtocolError {
    ProtocolError::new(
        object,
        ErrorCode::InvalidMethod,
        format!("request {:?} is not valid on object {}", request, object),
    )
}
