//! The seat global.
//!
//! A seat advertises which input device classes (pointer, keyboard, touch)
//! are available and a human-readable name. Every connection that binds the
//! seat gets the current values right away and then a fresh event each time
//! either one changes.

use crate::client::EventSender;
use crate::resource::ResourceId;
use lattice_core::protocol::seat::NAME_SINCE_VERSION;
use lattice_core::protocol::{ObjectId, SeatCapabilities, SeatEvent, SubchannelKind};
use tracing::debug;

/// One bound seat object. The seat does not own the resource; the display
/// calls [`SeatGlobal::unbind`] when the resource goes away.
#[derive(Debug, Clone)]
struct SeatBinding {
    resource: ResourceId,
    object: ObjectId,
    version: u32,
    sender: EventSender,
}

#[derive(Debug, Clone, Copy)]
struct SubchannelBinding {
    resource: ResourceId,
    kind: SubchannelKind,
}

#[derive(Debug)]
pub struct SeatGlobal {
    name: String,
    capabilities: SeatCapabilities,
    max_version: u32,
    bindings: Vec<SeatBinding>,
    subchannels: Vec<SubchannelBinding>,
}

impl SeatGlobal {
    /// Creates a seat advertising `capabilities`, bindable up to `max_version`.
    pub fn new(name: impl Into<String>, capabilities: SeatCapabilities, max_version: u32) -> Self {
        Self {
            name: name.into(),
            capabilities,
            max_version,
            bindings: Vec::new(),
            subchannels: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> SeatCapabilities {
        self.capabilities
    }

    pub fn max_version(&self) -> u32 {
        self.max_version
    }

    pub fn has_pointer(&self) -> bool {
        self.capabilities.contains(SeatCapabilities::POINTER)
    }

    pub fn has_keyboard(&self) -> bool {
        self.capabilities.contains(SeatCapabilities::KEYBOARD)
    }

    pub fn has_touch(&self) -> bool {
        self.capabilities.contains(SeatCapabilities::TOUCH)
    }

    /// Tracks a freshly bound seat resource and sends it the current state:
    /// capabilities first, then the name if the version carries it.
    pub(crate) fn bind(&mut self, resource: ResourceId, object: ObjectId, version: u32, sender: EventSender) {
        let binding = SeatBinding {
            resource,
            object,
            version,
            sender,
        };
        Self::send_capabilities(&binding, self.capabilities);
        Self::send_name(&binding, &self.name);
        debug!(
            "Seat '{}' bound by {} as object {} (version {})",
            self.name,
            binding.sender.connection(),
            object,
            version
        );
        self.bindings.push(binding);
    }

    /// Stops tracking `resource`. Returns `false` if it was not bound (already removed).
    pub(crate) fn unbind(&mut self, resource: ResourceId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.resource != resource);
        before != self.bindings.len()
    }

    pub(crate) fn add_subchannel(&mut self, resource: ResourceId, kind: SubchannelKind) {
        self.subchannels.push(SubchannelBinding { resource, kind });
    }

    pub(crate) fn remove_subchannel(&mut self, resource: ResourceId) -> bool {
        let before = self.subchannels.len();
        self.subchannels.retain(|s| s.resource != resource);
        before != self.subchannels.len()
    }

    /// Number of live sub-channels of `kind` across all connections.
    pub fn subchannel_count(&self, kind: SubchannelKind) -> usize {
        self.subchannels.iter().filter(|s| s.kind == kind).count()
    }

    /// Resources currently bound to this seat.
    pub fn bound_resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.bindings.iter().map(|b| b.resource)
    }

    /// Replaces the capability set. Broadcasts to every bound resource only if it changed.
    pub fn set_capabilities(&mut self, capabilities: SeatCapabilities) -> bool {
        if self.capabilities == capabilities {
            return false;
        }
        debug!(
            "Seat '{}' capabilities {:?} -> {:?}",
            self.name, self.capabilities, capabilities
        );
        self.capabilities = capabilities;
        for binding in &self.bindings {
            Self::send_capabilities(binding, capabilities);
        }
        true
    }

    fn set_capability(&mut self, flag: SeatCapabilities, enabled: bool) -> bool {
        let mut next = self.capabilities;
        next.set(flag, enabled);
        self.set_capabilities(next)
    }

    pub fn set_has_pointer(&mut self, has_pointer: bool) -> bool {
        self.set_capability(SeatCapabilities::POINTER, has_pointer)
    }

    pub fn set_has_keyboard(&mut self, has_keyboard: bool) -> bool {
        self.set_capability(SeatCapabilities::KEYBOARD, has_keyboard)
    }

    pub fn set_has_touch(&mut self, has_touch: bool) -> bool {
        self.set_capability(SeatCapabilities::TOUCH, has_touch)
    }

    /// Renames the seat. Resources bound below the name-carrying version hear nothing.
    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.name == name {
            return false;
        }
        debug!("Seat '{}' renamed to '{}'", self.name, name);
        self.name = name;
        for binding in &self.bindings {
            Self::send_name(binding, &self.name);
        }
        true
    }

    fn send_capabilities(binding: &SeatBinding, capabilities: SeatCapabilities) {
        binding
            .sender
            .send(binding.object, SeatEvent::Capabilities(capabilities));
    }

    fn send_name(binding: &SeatBinding, name: &str) {
        if binding.version >= NAME_SINCE_VERSION {
            binding.sender.send(binding.object, SeatEvent::Name(name.to_string()));
        }
    }
}
