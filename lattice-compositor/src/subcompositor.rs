//! # Subcompositor Logic
//!
//! Creation, destruction and manipulation of sub-surfaces: the parent
//! association, the position relative to the parent, stacking among siblings,
//! and the synchronization mode. The display's request dispatch calls into
//! these functions; the commit side lives in [`crate::surface`].

use crate::surface::{StackingOp, SurfaceKey, SurfaceRole, SurfaceTree};
use lattice_core::protocol::ErrorCode;
use tracing::debug;

/// Synchronization behavior of a sub-surface relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubsurfaceSyncMode {
    /// Commits are cached and applied when the parent's state is applied.
    #[default]
    Synchronized,
    /// Commits apply on their own, independent of any ancestor.
    Desynchronized,
}

/// Role state of a surface acting as a sub-surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsurfaceState {
    /// `None` once the parent surface has been destroyed.
    pub(crate) parent: Option<SurfaceKey>,
    pub(crate) position: (i32, i32),
    /// Applied when the parent's state is applied.
    pub(crate) pending_position: Option<(i32, i32)>,
    pub(crate) sync_mode: SubsurfaceSyncMode,
    /// Applied at this sub-surface's next commit.
    pub(crate) pending_sync_mode: Option<SubsurfaceSyncMode>,
    /// Committed state waiting for the parent (synchronized mode).
    pub(crate) cached: Option<crate::surface::PendingState>,
}

impl SubsurfaceState {
    fn new(parent: SurfaceKey) -> Self {
        Self {
            parent: Some(parent),
            position: (0, 0),
            pending_position: None,
            sync_mode: SubsurfaceSyncMode::default(),
            pending_sync_mode: None,
            cached: None,
        }
    }

    pub fn parent(&self) -> Option<SurfaceKey> {
        self.parent
    }

    /// The position currently in effect, relative to the parent's origin.
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn sync_mode(&self) -> SubsurfaceSyncMode {
        self.sync_mode
    }

    /// Whether a commit is parked waiting for the parent.
    pub fn has_cached_state(&self) -> bool {
        self.cached.is_some()
    }
}

/// Errors from sub-surface operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubsurfaceError {
    #[error("surface does not exist")]
    BadSurface,
    #[error("parent surface does not exist")]
    BadParent,
    #[error("surface already has a role")]
    SurfaceHasRole,
    #[error("surface is not a sub-surface")]
    NotASubsurface,
    #[error("surface would become its own ancestor")]
    CycleDetected,
    #[error("reference surface is neither a sibling nor the parent")]
    SiblingNotFound,
}

impl SubsurfaceError {
    /// The protocol error code posted to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubsurfaceError::BadSurface | SubsurfaceError::NotASubsurface | SubsurfaceError::SiblingNotFound => {
                ErrorCode::BadSurface
            }
            SubsurfaceError::BadParent | SubsurfaceError::CycleDetected => ErrorCode::BadParent,
            SubsurfaceError::SurfaceHasRole => ErrorCode::Role,
        }
    }
}

/// Turns `surface` into a sub-surface of `parent`.
///
/// The new sub-surface is stacked directly above everything in the parent's
/// current stacking order.
///
/// # Returns
/// `Err(SubsurfaceError::CycleDetected)` if `surface` is `parent` or one of
/// its ancestors, `Err(SubsurfaceError::SurfaceHasRole)` if `surface` already
/// has a role.
pub fn get_subsurface(tree: &mut SurfaceTree, surface: SurfaceKey, parent: SurfaceKey) -> Result<(), SubsurfaceError> {
    if surface == parent {
        return Err(SubsurfaceError::CycleDetected);
    }
    if tree.get(surface).is_none() {
        return Err(SubsurfaceError::BadSurface);
    }

    let mut ancestor = Some(parent);
    while let Some(current) = ancestor {
        if current == surface {
            return Err(SubsurfaceError::CycleDetected);
        }
        let node = tree.get(current).ok_or(SubsurfaceError::BadParent)?;
        ancestor = node.subsurface().and_then(|sub| sub.parent);
    }

    let child = tree.get_mut(surface).ok_or(SubsurfaceError::BadSurface)?;
    if child.role.is_some() {
        return Err(SubsurfaceError::SurfaceHasRole);
    }
    child.role = Some(SurfaceRole::Subsurface(SubsurfaceState::new(parent)));

    let parent_surface = tree.get_mut(parent).ok_or(SubsurfaceError::BadParent)?;
    parent_surface.stack.push(surface);
    debug!("Surface {:?} is now a sub-surface of {:?}", surface, parent);
    Ok(())
}

/// Removes the sub-surface role from `surface` and unlinks it from its parent.
///
/// The surface itself survives. Any cached commit is discarded. A surface
/// that is already gone or not a sub-surface is a no-op.
pub fn destroy_subsurface_role(tree: &mut SurfaceTree, surface: SurfaceKey) {
    let Some(node) = tree.get_mut(surface) else {
        return;
    };
    let parent = match node.role.take() {
        Some(SurfaceRole::Subsurface(state)) => state.parent,
        None => return,
    };
    if let Some(parent) = parent.and_then(|p| tree.get_mut(p)) {
        parent.stack.retain(|k| *k != surface);
    }
    debug!("Sub-surface role of {:?} destroyed", surface);
}

/// Stages a new position. Several calls before the parent applies: the last one wins.
pub fn set_position(tree: &mut SurfaceTree, surface: SurfaceKey, x: i32, y: i32) -> Result<(), SubsurfaceError> {
    let sub = tree
        .get_mut(surface)
        .ok_or(SubsurfaceError::BadSurface)?
        .subsurface_mut()
        .ok_or(SubsurfaceError::NotASubsurface)?;
    sub.pending_position = Some((x, y));
    Ok(())
}

/// Stages a sync-mode change, effective at the sub-surface's next commit.
pub fn set_sync_mode(
    tree: &mut SurfaceTree,
    surface: SurfaceKey,
    sync_mode: SubsurfaceSyncMode,
) -> Result<(), SubsurfaceError> {
    let sub = tree
        .get_mut(surface)
        .ok_or(SubsurfaceError::BadSurface)?
        .subsurface_mut()
        .ok_or(SubsurfaceError::NotASubsurface)?;
    sub.pending_sync_mode = Some(sync_mode);
    Ok(())
}

/// Stages placing `surface` directly above `sibling`.
pub fn place_above(tree: &mut SurfaceTree, surface: SurfaceKey, sibling: SurfaceKey) -> Result<(), SubsurfaceError> {
    stage_stacking(tree, surface, sibling, true)
}

/// Stages placing `surface` directly below `sibling`.
pub fn place_below(tree: &mut SurfaceTree, surface: SurfaceKey, sibling: SurfaceKey) -> Result<(), SubsurfaceError> {
    stage_stacking(tree, surface, sibling, false)
}

/// Validates a stacking request and appends it to the parent's pending
/// stacking log. The log is replayed in request order when the parent applies.
fn stage_stacking(
    tree: &mut SurfaceTree,
    surface: SurfaceKey,
    sibling: SurfaceKey,
    above: bool,
) -> Result<(), SubsurfaceError> {
    if surface == sibling {
        return Err(SubsurfaceError::SiblingNotFound);
    }
    let parent = tree
        .get(surface)
        .ok_or(SubsurfaceError::BadSurface)?
        .subsurface()
        .ok_or(SubsurfaceError::NotASubsurface)?
        .parent;
    let Some(parent) = parent else {
        // Orphaned: there is no stacking order left to change.
        return Ok(());
    };
    let parent_surface = tree.get_mut(parent).ok_or(SubsurfaceError::BadParent)?;
    if !parent_surface.stack.contains(&sibling) {
        return Err(SubsurfaceError::SiblingNotFound);
    }
    let op = if above {
        StackingOp::PlaceAbove { surface, sibling }
    } else {
        StackingOp::PlaceBelow { surface, sibling }
    };
    parent_surface.pending.stacking.push(op);
    Ok(())
}

/// Replays one stacking operation against a committed stacking list.
///
/// Entries destroyed since the request was made are skipped.
pub(crate) fn reorder_children(stack: &mut Vec<SurfaceKey>, op: StackingOp) {
    let (surface, sibling, above) = match op {
        StackingOp::PlaceAbove { surface, sibling } => (surface, sibling, true),
        StackingOp::PlaceBelow { surface, sibling } => (surface, sibling, false),
    };
    if surface == sibling || !stack.contains(&sibling) {
        return;
    }
    let Some(from) = stack.iter().position(|k| *k == surface) else {
        return;
    };
    stack.remove(from);
    if let Some(to) = stack.iter().position(|k| *k == sibling) {
        stack.insert(if above { to + 1 } else { to }, surface);
    }
}
