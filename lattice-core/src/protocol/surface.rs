//! Surface, compositor and sub-surface messages.

use super::ObjectId;

/// Opaque reference to client buffer content. Buffer management itself is
/// handled outside the protocol core; surfaces only track which buffer is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// An axis-aligned rectangle in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositorRequest {
    CreateSurface { id: ObjectId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubcompositorRequest {
    /// Gives `surface` the sub-surface role with `parent` as its parent.
    GetSubsurface {
        id: ObjectId,
        surface: ObjectId,
        parent: ObjectId,
    },
}

/// Requests on a surface. Everything except `Commit` and `Destroy` is staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceRequest {
    /// `None` detaches the current buffer.
    Attach { buffer: Option<BufferId> },
    Damage(Rectangle),
    SetBufferScale(i32),
    Commit,
    Destroy,
}

/// Requests on a sub-surface association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsurfaceRequest {
    SetPosition { x: i32, y: i32 },
    /// `sibling` is a sibling surface or the parent surface.
    PlaceAbove { sibling: ObjectId },
    PlaceBelow { sibling: ObjectId },
    SetSync,
    SetDesync,
    Destroy,
}
