//! Per-connection object bindings.
//!
//! Every object a client can address (a bound global, a surface, a
//! sub-surface association, a seat sub-channel) is a [`Resource`] stored in
//! one arena. Globals and surfaces refer to resources by [`ResourceId`] only,
//! so a resource destroyed during connection teardown simply stops resolving.

use crate::client::ConnectionId;
use crate::surface::SurfaceKey;
use lattice_core::arena::{Arena, Handle};
use lattice_core::protocol::{ErrorCode, Interface, ObjectId, ProtocolError, SubchannelKind};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Object ids above this value are reserved for compositor-created objects.
const CLIENT_ID_MAX: u32 = 0xFEFF_FFFF;

pub type ResourceId = Handle<Resource>;

/// What a resource is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceData {
    Seat,
    Subchannel(SubchannelKind),
    Compositor,
    Subcompositor,
    Surface(SurfaceKey),
    /// The sub-surface association; the key names the child surface.
    Subsurface(SurfaceKey),
    WindowManagement,
}

/// A connection-scoped binding instance.
#[derive(Debug, Clone)]
pub struct Resource {
    pub connection: ConnectionId,
    pub object: ObjectId,
    pub interface: Interface,
    /// Negotiated version. Objects created through another object inherit its version.
    pub version: u32,
    pub data: ResourceData,
}

#[derive(Debug)]
pub struct ResourceRegistry {
    resources: Arena<Resource>,
    objects: HashMap<ConnectionId, HashMap<ObjectId, ResourceId>>,
    max_objects_per_connection: u32,
}

impl ResourceRegistry {
    pub fn new(max_objects_per_connection: u32) -> Self {
        Self {
            resources: Arena::new(),
            objects: HashMap::new(),
            max_objects_per_connection,
        }
    }

    /// Registers a new object in `connection`'s id space.
    ///
    /// All checks happen before anything is stored, so a failed allocation
    /// leaves no trace. The error is addressed to the display object, since
    /// the new object never came into existence.
    pub fn create(
        &mut self,
        connection: ConnectionId,
        object: ObjectId,
        interface: Interface,
        version: u32,
        data: ResourceData,
    ) -> Result<ResourceId, ProtocolError> {
        if object.is_null() || object == ObjectId::DISPLAY || object.0 > CLIENT_ID_MAX {
            return Err(ProtocolError::new(
                ObjectId::DISPLAY,
                ErrorCode::InvalidId,
                format!("invalid new object id {}", object),
            ));
        }

        let count = self.objects.get(&connection).map_or(0, HashMap::len);
        if self
            .objects
            .get(&connection)
            .map_or(false, |ids| ids.contains_key(&object))
        {
            return Err(ProtocolError::new(
                ObjectId::DISPLAY,
                ErrorCode::InvalidId,
                format!("object id {} is already in use", object),
            ));
        }
        if count >= self.max_objects_per_connection as usize {
            warn!(
                "{} reached its object limit ({}), rejecting {} {}",
                connection, self.max_objects_per_connection, interface, object
            );
            return Err(ProtocolError::new(
                ObjectId::DISPLAY,
                ErrorCode::NoMemory,
                "object limit reached",
            ));
        }

        let id = self
            .resources
            .insert(Resource {
                connection,
                object,
                interface,
                version,
                data,
            })
            .ok_or_else(|| ProtocolError::new(ObjectId::DISPLAY, ErrorCode::NoMemory, "resource space exhausted"))?;
        self.objects.entry(connection).or_default().insert(object, id);
        debug!("{} created {}@{} (version {})", connection, interface, object, version);
        Ok(id)
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Resolves `object` in `connection`'s id space.
    pub fn lookup(&self, connection: ConnectionId, object: ObjectId) -> Option<(ResourceId, &Resource)> {
        let id = *self.objects.get(&connection)?.get(&object)?;
        self.resources.get(id).map(|resource| (id, resource))
    }

    /// Removes a resource. Destroying an already destroyed resource is a no-op.
    pub fn destroy(&mut self, id: ResourceId) -> Option<Resource> {
        let resource = self.resources.remove(id)?;
        if let Some(ids) = self.objects.get_mut(&resource.connection) {
            ids.remove(&resource.object);
        }
        debug!(
            "{} destroyed {}@{}",
            resource.connection, resource.interface, resource.object
        );
        Some(resource)
    }

    /// All live resources owned by `connection`.
    pub fn connection_resources(&self, connection: ConnectionId) -> Vec<ResourceId> {
        self.objects
            .get(&connection)
            .map(|ids| ids.values().copied().collect())
            .unwrap_or_default()
    }

    /// Forgets the id space of a connection. Call after its resources are destroyed.
    pub fn remove_connection(&mut self, connection: ConnectionId) {
        if let Some(ids) = self.objects.remove(&connection) {
            for id in ids.into_values() {
                self.resources.remove(id);
            }
        }
    }

    pub fn object_count(&self, connection: ConnectionId) -> usize {
        self.objects.get(&connection).map_or(0, HashMap::len)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
