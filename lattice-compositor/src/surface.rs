//! # Surfaces and the commit engine
//!
//! A surface keeps two copies of its state. Requests such as attach, damage
//! or set-buffer-scale only touch the **pending** copy; `commit` moves pending
//! into **current** in one step, so nothing observes a half-updated surface.
//!
//! Sub-surfaces add a third copy. A synchronized sub-surface does not apply
//! its own commits: the committed state is parked in a cache and applied when
//! the parent's state is applied. Because applying a parent also applies the
//! cached state of its synchronized children, a single top-level commit
//! cascades through any depth of synchronized descendants.
//!
//! State that belongs to the parent (child positions and the stacking order
//! of its children) is applied together with the parent's state.

use crate::client::ConnectionId;
use crate::subcompositor::{reorder_children, SubsurfaceState, SubsurfaceSyncMode};
use lattice_core::arena::{Arena, Handle};
use lattice_core::protocol::{BufferId, Rectangle};
use tracing::{debug, trace};

pub type SurfaceKey = Handle<Surface>;

/// The committed, visible state of a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceState {
    pub buffer: Option<BufferId>,
    pub buffer_scale: i32,
    /// Damage accumulated by the commit(s) that produced this state.
    pub damage: Vec<Rectangle>,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            buffer: None,
            buffer_scale: 1,
            damage: Vec::new(),
        }
    }
}

/// One `place_above` / `place_below` request, replayed at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackingOp {
    PlaceAbove { surface: SurfaceKey, sibling: SurfaceKey },
    PlaceBelow { surface: SurfaceKey, sibling: SurfaceKey },
}

/// Staged changes. Scalars are last-write-wins; lists keep request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingState {
    /// `Some(None)` detaches the buffer.
    pub buffer: Option<Option<BufferId>>,
    pub buffer_scale: Option<i32>,
    pub damage: Vec<Rectangle>,
    /// Reordering of this surface's children.
    pub stacking: Vec<StackingOp>,
}

impl PendingState {
    pub fn is_empty(&self) -> bool {
        self.buffer.is_none() && self.buffer_scale.is_none() && self.damage.is_empty() && self.stacking.is_empty()
    }

    /// Folds a later batch of changes on top of this one.
    pub(crate) fn merge(&mut self, newer: PendingState) {
        if newer.buffer.is_some() {
            self.buffer = newer.buffer;
        }
        if newer.buffer_scale.is_some() {
            self.buffer_scale = newer.buffer_scale;
        }
        self.damage.extend(newer.damage);
        self.stacking.extend(newer.stacking);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceRole {
    Subsurface(SubsurfaceState),
}

/// What a commit did with the pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Pending state became current (and cascaded to synchronized children).
    Applied,
    /// Synchronized sub-surface: state is cached until the parent applies.
    Cached,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface does not exist")]
    NoSuchSurface,
    #[error("buffer scale must be positive, got {0}")]
    InvalidScale(i32),
}

#[derive(Debug)]
pub struct Surface {
    key: SurfaceKey,
    owner: ConnectionId,
    pub(crate) pending: PendingState,
    current: SurfaceState,
    pub(crate) role: Option<SurfaceRole>,
    /// Bottom-to-top stacking of this surface and its sub-surfaces.
    pub(crate) stack: Vec<SurfaceKey>,
    commit_count: u64,
}

impl Surface {
    fn new(key: SurfaceKey, owner: ConnectionId) -> Self {
        Self {
            key,
            owner,
            pending: PendingState::default(),
            current: SurfaceState::default(),
            role: None,
            stack: vec![key],
            commit_count: 0,
        }
    }

    pub fn key(&self) -> SurfaceKey {
        self.key
    }

    pub fn owner(&self) -> ConnectionId {
        self.owner
    }

    pub fn current(&self) -> &SurfaceState {
        &self.current
    }

    pub fn pending(&self) -> &PendingState {
        &self.pending
    }

    pub fn role(&self) -> Option<&SurfaceRole> {
        self.role.as_ref()
    }

    pub fn subsurface(&self) -> Option<&SubsurfaceState> {
        match &self.role {
            Some(SurfaceRole::Subsurface(state)) => Some(state),
            None => None,
        }
    }

    pub(crate) fn subsurface_mut(&mut self) -> Option<&mut SubsurfaceState> {
        match &mut self.role {
            Some(SurfaceRole::Subsurface(state)) => Some(state),
            None => None,
        }
    }

    /// The committed stacking order, bottom to top, including this surface itself.
    pub fn stacking_order(&self) -> &[SurfaceKey] {
        &self.stack
    }

    /// Child sub-surfaces, bottom to top.
    pub fn children(&self) -> impl Iterator<Item = SurfaceKey> + '_ {
        self.stack.iter().copied().filter(move |k| *k != self.key)
    }

    /// How many times state has been applied to this surface.
    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }
}

/// Owner of every surface on the display.
#[derive(Debug, Default)]
pub struct SurfaceTree {
    surfaces: Arena<Surface>,
}

impl SurfaceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty, role-less surface. `None` if the arena is full.
    pub fn create(&mut self, owner: ConnectionId) -> Option<SurfaceKey> {
        let key = self.surfaces.insert_with(|key| Surface::new(key, owner))?;
        trace!("Surface {:?} created for {}", key, owner);
        Some(key)
    }

    pub fn get(&self, key: SurfaceKey) -> Option<&Surface> {
        self.surfaces.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: SurfaceKey) -> Option<&mut Surface> {
        self.surfaces.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn attach(&mut self, key: SurfaceKey, buffer: Option<BufferId>) -> Result<(), SurfaceError> {
        let surface = self.surfaces.get_mut(key).ok_or(SurfaceError::NoSuchSurface)?;
        surface.pending.buffer = Some(buffer);
        Ok(())
    }

    pub fn damage(&mut self, key: SurfaceKey, rect: Rectangle) -> Result<(), SurfaceError> {
        let surface = self.surfaces.get_mut(key).ok_or(SurfaceError::NoSuchSurface)?;
        if !rect.is_empty() {
            surface.pending.damage.push(rect);
        }
        Ok(())
    }

    pub fn set_buffer_scale(&mut self, key: SurfaceKey, scale: i32) -> Result<(), SurfaceError> {
        if scale <= 0 {
            return Err(SurfaceError::InvalidScale(scale));
        }
        let surface = self.surfaces.get_mut(key).ok_or(SurfaceError::NoSuchSurface)?;
        surface.pending.buffer_scale = Some(scale);
        Ok(())
    }

    /// Commits the pending state of `key`.
    ///
    /// A pending sync-mode change takes effect first, so it governs this
    /// commit. Synchronized sub-surfaces with a live parent cache the state;
    /// everything else applies it immediately, including state cached while
    /// the sub-surface was still synchronized.
    pub fn commit(&mut self, key: SurfaceKey) -> Result<CommitOutcome, SurfaceError> {
        let surface = self.surfaces.get_mut(key).ok_or(SurfaceError::NoSuchSurface)?;
        let mut state = std::mem::take(&mut surface.pending);

        if let Some(sub) = surface.subsurface_mut() {
            if let Some(mode) = sub.pending_sync_mode.take() {
                debug!("Sub-surface {:?} sync mode {:?} -> {:?}", key, sub.sync_mode, mode);
                sub.sync_mode = mode;
            }
            if sub.sync_mode == SubsurfaceSyncMode::Synchronized && sub.parent.is_some() {
                match sub.cached.as_mut() {
                    Some(cached) => cached.merge(state),
                    None => sub.cached = Some(state),
                }
                trace!("Sub-surface {:?} commit cached until parent applies", key);
                return Ok(CommitOutcome::Cached);
            }
            if let Some(mut cached) = sub.cached.take() {
                cached.merge(state);
                state = cached;
            }
        }

        self.apply_state(key, state);
        Ok(CommitOutcome::Applied)
    }

    /// Makes `state` current on `key`, then applies parent-owned child state
    /// and cascades into synchronized children that have cached commits.
    fn apply_state(&mut self, key: SurfaceKey, state: PendingState) {
        let children: Vec<SurfaceKey> = {
            let Some(surface) = self.surfaces.get_mut(key) else {
                return;
            };
            if let Some(buffer) = state.buffer {
                surface.current.buffer = buffer;
            }
            if let Some(scale) = state.buffer_scale {
                surface.current.buffer_scale = scale;
            }
            surface.current.damage = state.damage;
            surface.commit_count += 1;
            for op in &state.stacking {
                reorder_children(&mut surface.stack, *op);
            }
            surface.children().collect()
        };
        trace!("Surface {:?} applied state, {} children", key, children.len());

        for child in children {
            let cached = self.surfaces.get_mut(child).and_then(Surface::subsurface_mut).and_then(|sub| {
                if let Some(position) = sub.pending_position.take() {
                    sub.position = position;
                }
                if sub.sync_mode == SubsurfaceSyncMode::Synchronized {
                    sub.cached.take()
                } else {
                    None
                }
            });
            if let Some(cached) = cached {
                self.apply_state(child, cached);
            }
        }
    }

    /// Destroys a surface. Its parent forgets it; its children become orphans
    /// that keep their role but commit on their own from now on.
    pub fn destroy(&mut self, key: SurfaceKey) -> Option<Surface> {
        let surface = self.surfaces.remove(key)?;
        if let Some(parent) = surface.subsurface().and_then(|sub| sub.parent) {
            if let Some(parent) = self.surfaces.get_mut(parent) {
                parent.stack.retain(|k| *k != key);
            }
        }
        for child in surface.children() {
            if let Some(sub) = self.surfaces.get_mut(child).and_then(Surface::subsurface_mut) {
                sub.parent = None;
            }
        }
        debug!("Surface {:?} destroyed", key);
        Some(surface)
    }

    /// Keys of all surfaces owned by `owner`.
    pub fn owned_by(&self, owner: ConnectionId) -> Vec<SurfaceKey> {
        self.surfaces
            .iter()
            .filter(|(_, s)| s.owner == owner)
            .map(|(k, _)| k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Connection;
    use crate::subcompositor::{get_subsurface, set_position, set_sync_mode};
    use pretty_assertions::assert_eq;

    fn tree_with_owner() -> (SurfaceTree, ConnectionId) {
        let (conn, _rx) = Connection::new();
        (SurfaceTree::new(), conn.id())
    }

    #[test]
    fn test_commit_applies_pending_atomically() {
        let (mut tree, owner) = tree_with_owner();
        let s = tree.create(owner).unwrap();

        tree.attach(s, Some(BufferId(7))).unwrap();
        tree.set_buffer_scale(s, 2).unwrap();
        tree.damage(s, Rectangle::new(0, 0, 10, 10)).unwrap();
        assert_eq!(tree.get(s).unwrap().current(), &SurfaceState::default());

        assert_eq!(tree.commit(s), Ok(CommitOutcome::Applied));
        let current = tree.get(s).unwrap().current();
        assert_eq!(current.buffer, Some(BufferId(7)));
        assert_eq!(current.buffer_scale, 2);
        assert_eq!(current.damage, vec![Rectangle::new(0, 0, 10, 10)]);
        assert!(tree.get(s).unwrap().pending().is_empty());
    }

    #[test]
    fn test_last_attach_wins() {
        let (mut tree, owner) = tree_with_owner();
        let s = tree.create(owner).unwrap();
        tree.attach(s, Some(BufferId(1))).unwrap();
        tree.attach(s, Some(BufferId(2))).unwrap();
        tree.commit(s).unwrap();
        assert_eq!(tree.get(s).unwrap().current().buffer, Some(BufferId(2)));

        tree.attach(s, None).unwrap();
        tree.commit(s).unwrap();
        assert_eq!(tree.get(s).unwrap().current().buffer, None);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let (mut tree, owner) = tree_with_owner();
        let s = tree.create(owner).unwrap();
        assert_eq!(tree.set_buffer_scale(s, 0), Err(SurfaceError::InvalidScale(0)));
    }

    #[test]
    fn test_empty_commit_clears_damage() {
        let (mut tree, owner) = tree_with_owner();
        let s = tree.create(owner).unwrap();
        tree.damage(s, Rectangle::new(0, 0, 4, 4)).unwrap();
        tree.commit(s).unwrap();
        tree.commit(s).unwrap();
        assert!(tree.get(s).unwrap().current().damage.is_empty());
        assert_eq!(tree.get(s).unwrap().commit_count(), 2);
    }

    #[test]
    fn test_synchronized_child_waits_for_parent() {
        let (mut tree, owner) = tree_with_owner();
        let parent = tree.create(owner).unwrap();
        let child = tree.create(owner).unwrap();
        get_subsurface(&mut tree, child, parent).unwrap();

        tree.attach(child, Some(BufferId(5))).unwrap();
        assert_eq!(tree.commit(child), Ok(CommitOutcome::Cached));
        assert_eq!(tree.get(child).unwrap().current().buffer, None);

        tree.commit(parent).unwrap();
        assert_eq!(tree.get(child).unwrap().current().buffer, Some(BufferId(5)));
    }

    #[test]
    fn test_cached_commits_accumulate_until_parent_applies() {
        let (mut tree, owner) = tree_with_owner();
        let parent = tree.create(owner).unwrap();
        let child = tree.create(owner).unwrap();
        get_subsurface(&mut tree, child, parent).unwrap();

        tree.attach(child, Some(BufferId(1))).unwrap();
        tree.damage(child, Rectangle::new(0, 0, 1, 1)).unwrap();
        tree.commit(child).unwrap();
        tree.set_buffer_scale(child, 3).unwrap();
        tree.damage(child, Rectangle::new(1, 1, 1, 1)).unwrap();
        tree.commit(child).unwrap();

        tree.commit(parent).unwrap();
        let current = tree.get(child).unwrap().current();
        assert_eq!(current.buffer, Some(BufferId(1)));
        assert_eq!(current.buffer_scale, 3);
        assert_eq!(current.damage.len(), 2);
        assert_eq!(tree.get(child).unwrap().commit_count(), 1);
    }

    #[test]
    fn test_desynchronized_child_applies_immediately() {
        let (mut tree, owner) = tree_with_owner();
        let parent = tree.create(owner).unwrap();
        let child = tree.create(owner).unwrap();
        get_subsurface(&mut tree, child, parent).unwrap();
        set_sync_mode(&mut tree, child, SubsurfaceSyncMode::Desynchronized).unwrap();

        tree.attach(child, Some(BufferId(9))).unwrap();
        assert_eq!(tree.commit(child), Ok(CommitOutcome::Applied));
        assert_eq!(tree.get(child).unwrap().current().buffer, Some(BufferId(9)));
        assert_eq!(tree.get(parent).unwrap().commit_count(), 0);
    }

    #[test]
    fn test_cascade_through_nested_synchronized_chain() {
        let (mut tree, owner) = tree_with_owner();
        let root = tree.create(owner).unwrap();
        let middle = tree.create(owner).unwrap();
        let leaf = tree.create(owner).unwrap();
        get_subsurface(&mut tree, middle, root).unwrap();
        get_subsurface(&mut tree, leaf, middle).unwrap();

        tree.attach(leaf, Some(BufferId(3))).unwrap();
        tree.commit(leaf).unwrap();
        tree.commit(middle).unwrap();
        assert_eq!(tree.get(leaf).unwrap().current().buffer, None);
        assert_eq!(tree.get(middle).unwrap().commit_count(), 0);

        tree.commit(root).unwrap();
        assert_eq!(tree.get(middle).unwrap().commit_count(), 1);
        assert_eq!(tree.get(leaf).unwrap().current().buffer, Some(BufferId(3)));
    }

    #[test]
    fn test_switch_to_desync_flushes_cached_state() {
        let (mut tree, owner) = tree_with_owner();
        let parent = tree.create(owner).unwrap();
        let child = tree.create(owner).unwrap();
        get_subsurface(&mut tree, child, parent).unwrap();

        tree.attach(child, Some(BufferId(1))).unwrap();
        tree.commit(child).unwrap();
        set_sync_mode(&mut tree, child, SubsurfaceSyncMode::Desynchronized).unwrap();
        // Staged mode change: not retroactive.
        assert_eq!(tree.get(child).unwrap().current().buffer, None);

        tree.set_buffer_scale(child, 2).unwrap();
        assert_eq!(tree.commit(child), Ok(CommitOutcome::Applied));
        let current = tree.get(child).unwrap().current();
        assert_eq!(current.buffer, Some(BufferId(1)));
        assert_eq!(current.buffer_scale, 2);
    }

    #[test]
    fn test_position_is_last_write_wins_on_parent_commit() {
        let (mut tree, owner) = tree_with_owner();
        let parent = tree.create(owner).unwrap();
        let child = tree.create(owner).unwrap();
        get_subsurface(&mut tree, child, parent).unwrap();

        set_position(&mut tree, child, 10, 10).unwrap();
        set_position(&mut tree, child, 20, 30).unwrap();
        assert_eq!(tree.get(child).unwrap().subsurface().unwrap().position(), (0, 0));

        tree.commit(parent).unwrap();
        assert_eq!(tree.get(child).unwrap().subsurface().unwrap().position(), (20, 30));
    }

    #[test]
    fn test_destroying_parent_orphans_children() {
        let (mut tree, owner) = tree_with_owner();
        let parent = tree.create(owner).unwrap();
        let child = tree.create(owner).unwrap();
        get_subsurface(&mut tree, child, parent).unwrap();

        tree.attach(child, Some(BufferId(4))).unwrap();
        tree.commit(child).unwrap();
        assert!(tree.destroy(parent).is_some());

        let sub = tree.get(child).unwrap().subsurface().unwrap();
        assert_eq!(sub.parent(), None);
        // With no parent left to wait for, the next commit applies, including the cached state.
        assert_eq!(tree.commit(child), Ok(CommitOutcome::Applied));
        assert_eq!(tree.get(child).unwrap().current().buffer, Some(BufferId(4)));
    }

    #[test]
    fn test_destroying_child_removes_it_from_parent_stack() {
        let (mut tree, owner) = tree_with_owner();
        let parent = tree.create(owner).unwrap();
        let child = tree.create(owner).unwrap();
        get_subsurface(&mut tree, child, parent).unwrap();

        tree.destroy(child);
        assert_eq!(tree.get(parent).unwrap().stacking_order(), &[parent]);
        assert!(tree.destroy(child).is_none());
    }
}
