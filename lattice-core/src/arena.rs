//! Generational arena.
//!
//! Objects that reference each other (a global and its bound resources, a
//! parent surface and its children) hold [`Handle`]s into an [`Arena`] rather
//! than pointers. Each slot carries a generation counter that is bumped when
//! the slot is freed, so a handle kept past its object's destruction resolves
//! to `None` instead of aliasing whatever reuses the slot.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed, generation-checked index into an [`Arena<T>`].
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index. Only unique together with [`Handle::generation`].
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Packs the handle into a single integer, e.g. for log fields.
    pub fn to_bits(&self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }
}

// Manual impls: deriving would put bounds on `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// Slot storage with free-list reuse and generation-checked access.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` and returns its handle.
    ///
    /// Returns `None` when the index space (`u32`) is exhausted; `value` is
    /// dropped in that case and nothing is stored.
    pub fn insert(&mut self, value: T) -> Option<Handle<T>> {
        self.insert_with(|_| value)
    }

    /// Like [`Arena::insert`], but the value is built from its own handle.
    pub fn insert_with(&mut self, build: impl FnOnce(Handle<T>) -> T) -> Option<Handle<T>> {
        match self.free_head {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let (generation, next_free) = match slot {
                    Slot::Vacant { generation, next_free } => (*generation, *next_free),
                    Slot::Occupied { .. } => return None,
                };
                let handle = Handle::new(index, generation);
                *slot = Slot::Occupied {
                    generation,
                    value: build(handle),
                };
                self.free_head = next_free;
                self.len += 1;
                Some(handle)
            }
            None => {
                let index = u32::try_from(self.slots.len()).ok()?;
                let handle = Handle::new(index, 0);
                self.slots.push(Slot::Occupied {
                    generation: 0,
                    value: build(handle),
                });
                self.len += 1;
                Some(handle)
            }
        }
    }

    /// Removes the value behind `handle`. Stale handles return `None`.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {}
            _ => return None,
        }
        let next_generation = handle.generation.wrapping_add(1);
        let old = std::mem::replace(
            slot,
            Slot::Vacant {
                generation: next_generation,
                next_free: self.free_head,
            },
        );
        self.free_head = Some(handle.index);
        self.len -= 1;
        match old {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match self.slots.get(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.slots.get_mut(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Iterates live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Occupied { generation, value } => Some((Handle::new(index as u32, *generation), value)),
            Slot::Vacant { .. } => None,
        })
    }

    /// Handles of all live entries, collected so the arena can be mutated while walking them.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut arena = Arena::new();
        let a = arena.insert("a").unwrap();
        let b = arena.insert("b").unwrap();
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut arena = Arena::new();
        let first = arena.insert(1).unwrap();
        assert_eq!(arena.remove(first), Some(1));

        let second = arena.insert(2).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.get(second), Some(&2));
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut arena = Arena::new();
        let h = arena.insert(()).unwrap();
        assert!(arena.remove(h).is_some());
        assert!(arena.remove(h).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_insert_with_sees_own_handle() {
        let mut arena: Arena<(u32, &str)> = Arena::new();
        let h = arena.insert_with(|h| (h.index(), "self")).unwrap();
        assert_eq!(arena.get(h).map(|v| v.0), Some(h.index()));
    }

    #[test]
    fn test_iter_skips_vacant_slots() {
        let mut arena = Arena::new();
        let a = arena.insert('a').unwrap();
        let _b = arena.insert('b').unwrap();
        arena.remove(a);
        let values: Vec<char> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec!['b']);
    }
}
