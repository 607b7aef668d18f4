//! The window-management global.
//!
//! The compositor registers every window it manages here. Bound clients (task
//! bars, pagers) receive a creation event per window, then attribute events
//! in batches terminated by `Done`. Requests coming back from those clients are
//! never applied here: they are handed to the compositor through
//! [`WindowManagementGlobal::subscribe_requests`], and the compositor answers
//! by calling the setters, which produce the events.

use crate::client::{ConnectionId, EventSender};
use crate::error::DisplayError;
use crate::resource::ResourceId;
use lattice_core::protocol::{ObjectId, WindowEvent, WindowId, WindowRequest, WindowState};
use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

/// Server-side record of a managed window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedWindow {
    title: String,
    app_id: String,
    virtual_desktop: u32,
    state: WindowState,
    themed_icon_name: String,
}

impl ManagedWindow {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn virtual_desktop(&self) -> u32 {
        self.virtual_desktop
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn themed_icon_name(&self) -> &str {
        &self.themed_icon_name
    }
}

/// A client request about a window, as delivered to the compositor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequestEvent {
    pub connection: ConnectionId,
    pub request: WindowRequest,
}

#[derive(Debug, Clone)]
struct Binding {
    resource: ResourceId,
    object: ObjectId,
    version: u32,
    sender: EventSender,
}

impl Binding {
    fn send(&self, event: WindowEvent) {
        self.sender.send(self.object, event);
    }
}

#[derive(Debug)]
pub struct WindowManagementGlobal {
    max_version: u32,
    bindings: Vec<Binding>,
    windows: BTreeMap<WindowId, ManagedWindow>,
    /// `None` once every id has been handed out.
    next_window_id: Option<u32>,
    request_listeners: Vec<UnboundedSender<WindowRequestEvent>>,
}

impl WindowManagementGlobal {
    pub fn new(max_version: u32) -> Self {
        Self {
            max_version,
            bindings: Vec::new(),
            windows: BTreeMap::new(),
            next_window_id: Some(1),
            request_listeners: Vec::new(),
        }
    }

    pub fn max_version(&self) -> u32 {
        self.max_version
    }

    pub fn window(&self, id: WindowId) -> Option<&ManagedWindow> {
        self.windows.get(&id)
    }

    /// Live windows in creation order.
    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &ManagedWindow)> {
        self.windows.iter().map(|(id, w)| (*id, w))
    }

    /// Channel on which client requests are delivered to the compositor.
    pub fn subscribe_requests(&mut self) -> UnboundedReceiver<WindowRequestEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.request_listeners.push(tx);
        rx
    }

    /// Sends the full window list to a new binding, one complete batch per window.
    ///
    /// The binding speaks the lower of `version` and [`Self::max_version`].
    pub(crate) fn bind(&mut self, resource: ResourceId, object: ObjectId, version: u32, sender: EventSender) {
        let binding = Binding {
            resource,
            object,
            version: version.min(self.max_version),
            sender,
        };
        for (id, window) in &self.windows {
            binding.send(WindowEvent::WindowCreated { window: *id });
            for event in Self::snapshot_events(*id, window) {
                binding.send(event);
            }
            binding.send(WindowEvent::Done { window: *id });
        }
        debug!(
            "Window management bound by {} as object {} (version {}, {} windows replayed)",
            binding.sender.connection(),
            object,
            binding.version,
            self.windows.len()
        );
        self.bindings.push(binding);
    }

    pub(crate) fn unbind(&mut self, resource: ResourceId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.resource != resource);
        before != self.bindings.len()
    }

    fn snapshot_events(id: WindowId, window: &ManagedWindow) -> Vec<WindowEvent> {
        let mut events = Vec::new();
        if !window.title.is_empty() {
            events.push(WindowEvent::TitleChanged {
                window: id,
                title: window.title.clone(),
            });
        }
        if !window.app_id.is_empty() {
            events.push(WindowEvent::AppIdChanged {
                window: id,
                app_id: window.app_id.clone(),
            });
        }
        if window.virtual_desktop != 0 {
            events.push(WindowEvent::VirtualDesktopChanged {
                window: id,
                desktop: window.virtual_desktop,
            });
        }
        for flag in window.state.iter() {
            events.push(Self::state_event(id, flag, true));
        }
        events.push(WindowEvent::ThemedIconNameChanged {
            window: id,
            name: window.themed_icon_name.clone(),
        });
        events
    }

    fn state_event(window: WindowId, flag: WindowState, enabled: bool) -> WindowEvent {
        if flag == WindowState::ON_ALL_DESKTOPS {
            WindowEvent::OnAllDesktopsChanged {
                window,
                on_all_desktops: enabled,
            }
        } else {
            WindowEvent::StateChanged {
                window,
                state: flag,
                enabled,
            }
        }
    }

    fn broadcast(&self, events: &[WindowEvent]) {
        for binding in &self.bindings {
            for event in events {
                binding.send(event.clone());
            }
        }
    }

    /// Registers a new window and announces it.
    ///
    /// The announcement is followed by an initial batch carrying the (empty)
    /// themed icon name, so clients resolve their icon right away.
    pub fn create_window(&mut self) -> Result<WindowId, DisplayError> {
        let raw = self.next_window_id.ok_or(DisplayError::WindowIdsExhausted)?;
        self.next_window_id = raw.checked_add(1);
        let id = WindowId(raw);
        self.windows.insert(id, ManagedWindow::default());
        debug!("Window {} created", id);
        self.broadcast(&[
            WindowEvent::WindowCreated { window: id },
            WindowEvent::ThemedIconNameChanged {
                window: id,
                name: String::new(),
            },
            WindowEvent::Done { window: id },
        ]);
        Ok(id)
    }

    /// Removes a window and tells every client it is gone.
    pub fn close_window(&mut self, id: WindowId) -> Result<(), DisplayError> {
        self.windows.remove(&id).ok_or(DisplayError::UnknownWindow(id))?;
        debug!("Window {} closed", id);
        self.broadcast(&[WindowEvent::Closed { window: id }]);
        Ok(())
    }

    /// Applies `update` to the window and, if it produced events, broadcasts
    /// them followed by `Done`. Returns whether anything changed.
    fn update(
        &mut self,
        id: WindowId,
        update: impl FnOnce(&mut ManagedWindow) -> Vec<WindowEvent>,
    ) -> Result<bool, DisplayError> {
        let window = self.windows.get_mut(&id).ok_or(DisplayError::UnknownWindow(id))?;
        let mut events = update(window);
        if events.is_empty() {
            return Ok(false);
        }
        trace!("Window {} changed: {:?}", id, events);
        events.push(WindowEvent::Done { window: id });
        self.broadcast(&events);
        Ok(true)
    }

    pub fn set_title(&mut self, id: WindowId, title: impl Into<String>) -> Result<bool, DisplayError> {
        let title = title.into();
        self.update(id, |w| {
            if w.title == title {
                return Vec::new();
            }
            w.title = title.clone();
            vec![WindowEvent::TitleChanged { window: id, title }]
        })
    }

    pub fn set_app_id(&mut self, id: WindowId, app_id: impl Into<String>) -> Result<bool, DisplayError> {
        let app_id = app_id.into();
        self.update(id, |w| {
            if w.app_id == app_id {
                return Vec::new();
            }
            w.app_id = app_id.clone();
            vec![WindowEvent::AppIdChanged { window: id, app_id }]
        })
    }

    pub fn set_virtual_desktop(&mut self, id: WindowId, desktop: u32) -> Result<bool, DisplayError> {
        self.update(id, |w| {
            if w.virtual_desktop == desktop {
                return Vec::new();
            }
            w.virtual_desktop = desktop;
            vec![WindowEvent::VirtualDesktopChanged { window: id, desktop }]
        })
    }

    /// Sets or clears every flag in `flags`. One event per flag that actually
    /// changes, then a single `Done`.
    pub fn set_state(&mut self, id: WindowId, flags: WindowState, enabled: bool) -> Result<bool, DisplayError> {
        self.update(id, |w| {
            let mut events = Vec::new();
            for flag in flags.iter() {
                if w.state.contains(flag) != enabled {
                    w.state.set(flag, enabled);
                    events.push(Self::state_event(id, flag, enabled));
                }
            }
            events
        })
    }

    pub fn set_themed_icon_name(&mut self, id: WindowId, name: impl Into<String>) -> Result<bool, DisplayError> {
        let name = name.into();
        self.update(id, |w| {
            if w.themed_icon_name == name {
                return Vec::new();
            }
            w.themed_icon_name = name.clone();
            vec![WindowEvent::ThemedIconNameChanged { window: id, name }]
        })
    }

    /// Forwards a client request to the compositor.
    ///
    /// Requests naming a window that has already closed are dropped: the
    /// client may simply not have seen the close event yet.
    pub(crate) fn handle_request(&mut self, connection: ConnectionId, request: WindowRequest) {
        if !self.windows.contains_key(&request.window()) {
            trace!("Dropping {:?} from {}: window no longer exists", request, connection);
            return;
        }
        debug!("{} requests {:?}", connection, request);
        let event = WindowRequestEvent { connection, request };
        self.request_listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
