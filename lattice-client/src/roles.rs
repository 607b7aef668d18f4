//! Role catalog of the window model.
//!
//! Presentation layers address window attributes by numeric role id. The two
//! generic roles keep the ids toolkits conventionally give them (`0` for the
//! display text, `1` for the decoration icon); window-specific roles start
//! right after [`USER_ROLE`].

use lattice_core::protocol::WindowState;

/// First id available to model-specific roles.
pub const USER_ROLE: i32 = 0x100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WindowRole {
    /// The window title.
    Display,
    /// The window icon.
    Decoration,
    AppId,
    IsActive,
    IsFullscreenable,
    IsFullscreen,
    IsMaximizable,
    IsMaximized,
    IsMinimizable,
    IsMinimized,
    IsKeepAbove,
    IsKeepBelow,
    VirtualDesktop,
    IsOnAllDesktops,
    IsDemandingAttention,
    SkipTaskbar,
    IsShadeable,
    IsShaded,
    IsMovable,
    IsResizable,
}

impl WindowRole {
    /// Every role, in id order.
    pub const ALL: [WindowRole; 20] = [
        WindowRole::Display,
        WindowRole::Decoration,
        WindowRole::AppId,
        WindowRole::IsActive,
        WindowRole::IsFullscreenable,
        WindowRole::IsFullscreen,
        WindowRole::IsMaximizable,
        WindowRole::IsMaximized,
        WindowRole::IsMinimizable,
        WindowRole::IsMinimized,
        WindowRole::IsKeepAbove,
        WindowRole::IsKeepBelow,
        WindowRole::VirtualDesktop,
        WindowRole::IsOnAllDesktops,
        WindowRole::IsDemandingAttention,
        WindowRole::SkipTaskbar,
        WindowRole::IsShadeable,
        WindowRole::IsShaded,
        WindowRole::IsMovable,
        WindowRole::IsResizable,
    ];

    pub fn id(self) -> i32 {
        match self {
            WindowRole::Display => 0,
            WindowRole::Decoration => 1,
            WindowRole::AppId => USER_ROLE + 1,
            WindowRole::IsActive => USER_ROLE + 2,
            WindowRole::IsFullscreenable => USER_ROLE + 3,
            WindowRole::IsFullscreen => USER_ROLE + 4,
            WindowRole::IsMaximizable => USER_ROLE + 5,
            WindowRole::IsMaximized => USER_ROLE + 6,
            WindowRole::IsMinimizable => USER_ROLE + 7,
            WindowRole::IsMinimized => USER_ROLE + 8,
            WindowRole::IsKeepAbove => USER_ROLE + 9,
            WindowRole::IsKeepBelow => USER_ROLE + 10,
            WindowRole::VirtualDesktop => USER_ROLE + 11,
            WindowRole::IsOnAllDesktops => USER_ROLE + 12,
            WindowRole::IsDemandingAttention => USER_ROLE + 13,
            WindowRole::SkipTaskbar => USER_ROLE + 14,
            WindowRole::IsShadeable => USER_ROLE + 15,
            WindowRole::IsShaded => USER_ROLE + 16,
            WindowRole::IsMovable => USER_ROLE + 17,
            WindowRole::IsResizable => USER_ROLE + 18,
        }
    }

    pub fn from_id(id: i32) -> Option<WindowRole> {
        Self::ALL.iter().copied().find(|role| role.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            WindowRole::Display => "DisplayRole",
            WindowRole::Decoration => "DecorationRole",
            WindowRole::AppId => "AppId",
            WindowRole::IsActive => "IsActive",
            WindowRole::IsFullscreenable => "IsFullscreenable",
            WindowRole::IsFullscreen => "IsFullscreen",
            WindowRole::IsMaximizable => "IsMaximizable",
            WindowRole::IsMaximized => "IsMaximized",
            WindowRole::IsMinimizable => "IsMinimizable",
            WindowRole::IsMinimized => "IsMinimized",
            WindowRole::IsKeepAbove => "IsKeepAbove",
            WindowRole::IsKeepBelow => "IsKeepBelow",
            WindowRole::VirtualDesktop => "VirtualDesktop",
            WindowRole::IsOnAllDesktops => "IsOnAllDesktops",
            WindowRole::IsDemandingAttention => "IsDemandingAttention",
            WindowRole::SkipTaskbar => "SkipTaskbar",
            WindowRole::IsShadeable => "IsShadeable",
            WindowRole::IsShaded => "IsShaded",
            WindowRole::IsMovable => "IsMovable",
            WindowRole::IsResizable => "IsResizable",
        }
    }

    /// The state flag backing a boolean role.
    pub fn state_flag(self) -> Option<WindowState> {
        let flag = match self {
            WindowRole::IsActive => WindowState::ACTIVE,
            WindowRole::IsFullscreenable => WindowState::FULLSCREENABLE,
            WindowRole::IsFullscreen => WindowState::FULLSCREEN,
            WindowRole::IsMaximizable => WindowState::MAXIMIZABLE,
            WindowRole::IsMaximized => WindowState::MAXIMIZED,
            WindowRole::IsMinimizable => WindowState::MINIMIZABLE,
            WindowRole::IsMinimized => WindowState::MINIMIZED,
            WindowRole::IsKeepAbove => WindowState::KEEP_ABOVE,
            WindowRole::IsKeepBelow => WindowState::KEEP_BELOW,
            WindowRole::IsOnAllDesktops => WindowState::ON_ALL_DESKTOPS,
            WindowRole::IsDemandingAttention => WindowState::DEMANDS_ATTENTION,
            WindowRole::SkipTaskbar => WindowState::SKIP_TASKBAR,
            WindowRole::IsShadeable => WindowState::SHADEABLE,
            WindowRole::IsShaded => WindowState::SHADED,
            WindowRole::IsMovable => WindowState::MOVABLE,
            WindowRole::IsResizable => WindowState::RESIZABLE,
            WindowRole::Display | WindowRole::Decoration | WindowRole::AppId | WindowRole::VirtualDesktop => {
                return None
            }
        };
        Some(flag)
    }
}

impl From<WindowRole> for i32 {
    fn from(role: WindowRole) -> i32 {
        role.id()
    }
}

/// Role ids and names, in id order.
pub fn role_catalog() -> Vec<(i32, &'static str)> {
    WindowRole::ALL.iter().map(|role| (role.id(), role.name())).collect()
}

/// A window icon as far as the model knows it. Theme lookup is left to the
/// presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum WindowIcon {
    /// No icon information has arrived yet.
    #[default]
    None,
    /// The window has no themed icon; show a generic one.
    Fallback,
    Themed(String),
}

impl WindowIcon {
    pub fn from_themed_name(name: &str) -> WindowIcon {
        if name.is_empty() {
            WindowIcon::Fallback
        } else {
            WindowIcon::Themed(name.to_owned())
        }
    }
}

/// A value returned by [`crate::WindowModel::data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleValue {
    /// Returned for rows out of range and unknown role ids.
    Invalid,
    String(String),
    UInt(u32),
    Bool(bool),
    Icon(WindowIcon),
}

impl RoleValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RoleValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RoleValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            RoleValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, RoleValue::Invalid)
    }
}
