//! Window-management messages.
//!
//! The compositor announces each managed window with
//! [`WindowEvent::WindowCreated`], then streams attribute events for it. A
//! batch of attribute events is terminated by [`WindowEvent::Done`]; clients
//! apply the batch atomically when they see it.

use bitflags::bitflags;
use std::fmt;

/// Stable identifier of a managed window. Never reused by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

bitflags! {
    /// Boolean window attributes.
    ///
    /// State events and state requests always name a single flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowState: u32 {
        const ACTIVE = 1 << 0;
        const MINIMIZED = 1 << 1;
        const MAXIMIZED = 1 << 2;
        const FULLSCREEN = 1 << 3;
        const KEEP_ABOVE = 1 << 4;
        const KEEP_BELOW = 1 << 5;
        const ON_ALL_DESKTOPS = 1 << 6;
        const DEMANDS_ATTENTION = 1 << 7;
        const MINIMIZABLE = 1 << 8;
        const MAXIMIZABLE = 1 << 9;
        const FULLSCREENABLE = 1 << 10;
        const SKIP_TASKBAR = 1 << 11;
        const SHADEABLE = 1 << 12;
        const SHADED = 1 << 13;
        const MOVABLE = 1 << 14;
        const RESIZABLE = 1 << 15;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    WindowCreated { window: WindowId },
    TitleChanged { window: WindowId, title: String },
    AppIdChanged { window: WindowId, app_id: String },
    VirtualDesktopChanged { window: WindowId, desktop: u32 },
    OnAllDesktopsChanged { window: WindowId, on_all_desktops: bool },
    /// `state` names exactly one flag.
    StateChanged { window: WindowId, state: WindowState, enabled: bool },
    /// An empty name means the window has no themed icon.
    ThemedIconNameChanged { window: WindowId, name: String },
    Done { window: WindowId },
    /// The window is gone; the id will not be used again.
    Closed { window: WindowId },
}

impl WindowEvent {
    pub fn window(&self) -> WindowId {
        match self {
            WindowEvent::WindowCreated { window }
            | WindowEvent::TitleChanged { window, .. }
            | WindowEvent::AppIdChanged { window, .. }
            | WindowEvent::VirtualDesktopChanged { window, .. }
            | WindowEvent::OnAllDesktopsChanged { window, .. }
            | WindowEvent::StateChanged { window, .. }
            | WindowEvent::ThemedIconNameChanged { window, .. }
            | WindowEvent::Done { window }
            | WindowEvent::Closed { window } => *window,
        }
    }
}

/// Requests a client can make about a window. The compositor decides whether
/// to honor them; the client only learns the outcome through events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowRequest {
    Activate { window: WindowId },
    Close { window: WindowId },
    Move { window: WindowId },
    Resize { window: WindowId },
    SetVirtualDesktop { window: WindowId, desktop: u32 },
    /// `state` names exactly one flag.
    SetState { window: WindowId, state: WindowState, enabled: bool },
}

impl WindowRequest {
    pub fn window(&self) -> WindowId {
        match self {
            WindowRequest::Activate { window }
            | WindowRequest::Close { window }
            | WindowRequest::Move { window }
            | WindowRequest::Resize { window }
            | WindowRequest::SetVirtualDesktop { window, .. }
            | WindowRequest::SetState { window, .. } => *window,
        }
    }
}
