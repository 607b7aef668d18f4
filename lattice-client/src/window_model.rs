//! Client-side replica of the compositor's window list.
//!
//! The model only ever changes in response to compositor events. Attribute
//! events are staged per window and applied together when the window's
//! `Done` arrives; at that point the model compares old and new values and
//! emits at most one [`ModelChange::DataChanged`] listing the roles that
//! really changed. User requests go back to the compositor unchanged: a
//! toggle sends the negation of what the model currently shows and waits for
//! the compositor's answer like everything else.

use crate::connection::Connection;
use crate::roles::{RoleValue, WindowIcon, WindowRole};
use lattice_core::protocol::{ObjectId, WindowEvent, WindowId, WindowRequest, WindowState};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

/// Destination of the requests a [`WindowModel`] forwards.
pub trait RequestSink: Send + Sync {
    fn send_request(&self, request: WindowRequest);
}

/// Sends window requests through a bound window-management object.
#[derive(Debug, Clone)]
pub struct WindowManagementProxy {
    connection: Connection,
    object: ObjectId,
}

impl WindowManagementProxy {
    pub fn new(connection: Connection, object: ObjectId) -> Self {
        Self { connection, object }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }
}

impl RequestSink for WindowManagementProxy {
    fn send_request(&self, request: WindowRequest) {
        self.connection.send(self.object, request);
    }
}

/// Change notifications, emitted right after the model has changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChange {
    /// Rows `first..=last` were inserted.
    RowsInserted { first: usize, last: usize },
    /// Rows `first..=last` were removed; later rows moved up.
    RowsRemoved { first: usize, last: usize },
    /// The listed roles of `row` changed, in role id order.
    DataChanged { row: usize, roles: Vec<WindowRole> },
}

/// One window as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowItem {
    id: WindowId,
    title: String,
    app_id: String,
    virtual_desktop: u32,
    state: WindowState,
    icon: WindowIcon,
}

impl WindowItem {
    fn new(id: WindowId) -> Self {
        Self {
            id,
            title: String::new(),
            app_id: String::new(),
            virtual_desktop: 0,
            state: WindowState::empty(),
            icon: WindowIcon::None,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

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

    pub fn icon(&self) -> &WindowIcon {
        &self.icon
    }

    pub fn value(&self, role: WindowRole) -> RoleValue {
        if let Some(flag) = role.state_flag() {
            return RoleValue::Bool(self.state.contains(flag));
        }
        match role {
            WindowRole::Display => RoleValue::String(self.title.clone()),
            WindowRole::Decoration => RoleValue::Icon(self.icon.clone()),
            WindowRole::AppId => RoleValue::String(self.app_id.clone()),
            WindowRole::VirtualDesktop => RoleValue::UInt(self.virtual_desktop),
            _ => RoleValue::Invalid,
        }
    }

    fn apply(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::TitleChanged { title, .. } => self.title = title,
            WindowEvent::AppIdChanged { app_id, .. } => self.app_id = app_id,
            WindowEvent::VirtualDesktopChanged { desktop, .. } => self.virtual_desktop = desktop,
            WindowEvent::OnAllDesktopsChanged { on_all_desktops, .. } => {
                self.state.set(WindowState::ON_ALL_DESKTOPS, on_all_desktops)
            }
            WindowEvent::StateChanged { state, enabled, .. } => self.state.set(state, enabled),
            WindowEvent::ThemedIconNameChanged { name, .. } => self.icon = WindowIcon::from_themed_name(&name),
            WindowEvent::WindowCreated { .. } | WindowEvent::Done { .. } | WindowEvent::Closed { .. } => {}
        }
    }

    fn changed_roles(&self, other: &WindowItem) -> Vec<WindowRole> {
        WindowRole::ALL
            .iter()
            .copied()
            .filter(|role| self.value(*role) != other.value(*role))
            .collect()
    }
}

/// Ordered list of the compositor's windows, in creation order.
pub struct WindowModel {
    items: Vec<WindowItem>,
    /// Staged copy of each item with an open batch.
    pending: HashMap<WindowId, WindowItem>,
    listeners: Vec<UnboundedSender<ModelChange>>,
    sink: Box<dyn RequestSink>,
}

impl std::fmt::Debug for WindowModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowModel")
            .field("items", &self.items)
            .field("pending", &self.pending.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl WindowModel {
    pub fn new(sink: impl RequestSink + 'static) -> Self {
        Self {
            items: Vec::new(),
            pending: HashMap::new(),
            listeners: Vec::new(),
            sink: Box::new(sink),
        }
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&mut self) -> UnboundedReceiver<ModelChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    fn notify(&mut self, change: ModelChange) {
        trace!("Window model change: {:?}", change);
        self.listeners.retain(|tx| tx.send(change.clone()).is_ok());
    }

    pub fn row_count(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[WindowItem] {
        &self.items
    }

    pub fn row_of(&self, id: WindowId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// The item at `row`. Negative and past-the-end rows give `None`.
    pub fn item(&self, row: i32) -> Option<&WindowItem> {
        usize::try_from(row).ok().and_then(|row| self.items.get(row))
    }

    /// The value of `role` for `row`, or [`RoleValue::Invalid`] for an
    /// invalid row or unknown role id.
    pub fn data(&self, row: i32, role: impl Into<i32>) -> RoleValue {
        match (self.item(row), WindowRole::from_id(role.into())) {
            (Some(item), Some(role)) => item.value(role),
            _ => RoleValue::Invalid,
        }
    }

    pub fn handle_event(&mut self, event: WindowEvent) {
        let id = event.window();
        match event {
            WindowEvent::WindowCreated { .. } => {
                if self.row_of(id).is_some() {
                    warn!("Ignoring duplicate announcement of {}", id);
                    return;
                }
                self.items.push(WindowItem::new(id));
                let row = self.items.len() - 1;
                debug!("{} added at row {}", id, row);
                self.notify(ModelChange::RowsInserted { first: row, last: row });
            }
            WindowEvent::Closed { .. } => {
                self.pending.remove(&id);
                let Some(row) = self.row_of(id) else {
                    trace!("Close for unknown {}", id);
                    return;
                };
                self.items.remove(row);
                debug!("{} removed from row {}", id, row);
                self.notify(ModelChange::RowsRemoved { first: row, last: row });
            }
            WindowEvent::Done { .. } => self.apply_pending(id),
            attribute => {
                let Some(row) = self.row_of(id) else {
                    trace!("Attribute event for unknown {}: {:?}", id, attribute);
                    return;
                };
                let current = &self.items[row];
                self.pending
                    .entry(id)
                    .or_insert_with(|| current.clone())
                    .apply(attribute);
            }
        }
    }

    fn apply_pending(&mut self, id: WindowId) {
        let Some(staged) = self.pending.remove(&id) else {
            return;
        };
        let Some(row) = self.row_of(id) else {
            return;
        };
        let roles = self.items[row].changed_roles(&staged);
        self.items[row] = staged;
        if !roles.is_empty() {
            self.notify(ModelChange::DataChanged { row, roles });
        }
    }

    fn forward(&self, row: i32, build: impl FnOnce(&WindowItem) -> WindowRequest) {
        match self.item(row) {
            Some(item) => self.sink.send_request(build(item)),
            None => trace!("Ignoring request for invalid row {}", row),
        }
    }

    pub fn request_activate(&self, row: i32) {
        self.forward(row, |item| WindowRequest::Activate { window: item.id });
    }

    pub fn request_close(&self, row: i32) {
        self.forward(row, |item| WindowRequest::Close { window: item.id });
    }

    pub fn request_move(&self, row: i32) {
        self.forward(row, |item| WindowRequest::Move { window: item.id });
    }

    pub fn request_resize(&self, row: i32) {
        self.forward(row, |item| WindowRequest::Resize { window: item.id });
    }

    pub fn request_virtual_desktop(&self, row: i32, desktop: u32) {
        self.forward(row, |item| WindowRequest::SetVirtualDesktop {
            window: item.id,
            desktop,
        });
    }

    fn request_toggle(&self, row: i32, flag: WindowState) {
        self.forward(row, |item| WindowRequest::SetState {
            window: item.id,
            state: flag,
            enabled: !item.state.contains(flag),
        });
    }

    pub fn request_toggle_minimized(&self, row: i32) {
        self.request_toggle(row, WindowState::MINIMIZED);
    }

    pub fn request_toggle_maximized(&self, row: i32) {
        self.request_toggle(row, WindowState::MAXIMIZED);
    }

    pub fn request_toggle_shaded(&self, row: i32) {
        self.request_toggle(row, WindowState::SHADED);
    }
}
