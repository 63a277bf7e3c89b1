//! Fixed-capacity slot pool with generational handles
//!
//! Values live in a fixed array of slots. Insertion takes the lowest free
//! slot, iteration walks occupied slots in index order, and removal is keyed
//! by a [`Handle`] whose generation must match the slot's current one.
//!
//! Removal can be immediate ([`Pool::remove`]) or deferred
//! ([`Pool::mark_removed`] + [`Pool::flush_removed`]). A marked value is
//! invisible to lookups and iteration but keeps its slot until the flush, so
//! a scan that marks entities never frees a slot it has not visited yet.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identity of a pooled value: slot index plus slot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Pool consistency violations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The handle does not name a live value (stale, out of range, or already removed)
    #[error("value not in pool (slot {index}, generation {generation})")]
    NotPresent { index: usize, generation: u32 },
}

impl PoolError {
    pub(crate) fn not_present(handle: Handle) -> Self {
        PoolError::NotPresent {
            index: handle.index(),
            generation: handle.generation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
    #[serde(default)]
    pending_removal: bool,
}

impl<T> Slot<T> {
    #[inline]
    fn is_live(&self) -> bool {
        self.value.is_some() && !self.pending_removal
    }
}

/// Fixed-capacity container; never grows past the capacity given at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    len: usize,
}

impl<T> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot {
            generation: 0,
            value: None,
            pending_removal: false,
        });
        Self { slots, len: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live values (marked values excluded)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when no slot is free for insertion. Marked-but-unflushed slots
    /// still count as taken.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.value.is_some())
    }

    /// Store `value` in the lowest free slot.
    ///
    /// Returns `None` when every slot is taken; the caller decides whether
    /// that is fatal.
    pub fn insert(&mut self, value: T) -> Option<Handle> {
        let index = self.slots.iter().position(|s| s.value.is_none())?;
        let slot = &mut self.slots[index];
        slot.value = Some(value);
        slot.pending_removal = false;
        self.len += 1;
        Some(Handle {
            index: index as u32,
            generation: slot.generation,
        })
    }

    fn live_slot(&self, handle: Handle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation && s.is_live())
    }

    fn live_slot_mut(&mut self, handle: Handle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation && s.is_live())
    }

    /// Whether `handle` names a live value
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.live_slot(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.live_slot(handle).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.live_slot_mut(handle).and_then(|s| s.value.as_mut())
    }

    /// Free the slot named by `handle` immediately and return its value.
    pub fn remove(&mut self, handle: Handle) -> Result<T, PoolError> {
        let slot = self
            .live_slot_mut(handle)
            .ok_or(PoolError::not_present(handle))?;
        let value = slot.value.take().ok_or(PoolError::not_present(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.len -= 1;
        Ok(value)
    }

    /// Flag a live value for removal at the next [`Pool::flush_removed`].
    ///
    /// The value disappears from lookups and iteration right away. Marking a
    /// value twice is an error.
    pub fn mark_removed(&mut self, handle: Handle) -> Result<(), PoolError> {
        let slot = self
            .live_slot_mut(handle)
            .ok_or(PoolError::not_present(handle))?;
        slot.pending_removal = true;
        self.len -= 1;
        Ok(())
    }

    /// Free every marked slot. Returns how many were freed.
    pub fn flush_removed(&mut self) -> usize {
        let mut freed = 0;
        for slot in self.slots.iter_mut().filter(|s| s.pending_removal) {
            slot.value = None;
            slot.pending_removal = false;
            slot.generation = slot.generation.wrapping_add(1);
            freed += 1;
        }
        freed
    }

    /// First live handle at slot index `from` or above.
    ///
    /// Cursor for scans that mutate the pool between steps: the caller keeps
    /// only an index, so inserts and removals elsewhere never invalidate it.
    pub fn next_live(&self, from: usize) -> Option<Handle> {
        self.slots
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, s)| s.is_live())
            .map(|(i, s)| Handle {
                index: i as u32,
                generation: s.generation,
            })
    }

    /// Live values in ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            if s.pending_removal {
                return None;
            }
            s.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            if s.pending_removal {
                return None;
            }
            let generation = s.generation;
            s.value.as_mut().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_until_full() {
        let mut pool = Pool::with_capacity(3);
        assert!(pool.insert('a').is_some());
        assert!(pool.insert('b').is_some());
        assert!(pool.insert('c').is_some());
        assert!(pool.is_full());
        assert_eq!(pool.insert('d'), None);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_reinsert_reuses_lowest_free_slot() {
        let mut pool = Pool::with_capacity(4);
        let a = pool.insert(1).unwrap();
        let b = pool.insert(2).unwrap();
        let _c = pool.insert(3).unwrap();
        pool.remove(b).unwrap();
        pool.remove(a).unwrap();

        let d = pool.insert(4).unwrap();
        assert_eq!(d.index(), 0);
        let e = pool.insert(5).unwrap();
        assert_eq!(e.index(), 1);
        let f = pool.insert(6).unwrap();
        assert_eq!(f.index(), 3);
    }

    #[test]
    fn test_remove_absent_is_error() {
        let mut pool = Pool::with_capacity(2);
        let a = pool.insert("x").unwrap();
        assert_eq!(pool.remove(a), Ok("x"));
        assert_eq!(
            pool.remove(a),
            Err(PoolError::NotPresent {
                index: 0,
                generation: 0
            })
        );
    }

    #[test]
    fn test_stale_handle_does_not_alias_new_value() {
        let mut pool = Pool::with_capacity(1);
        let old = pool.insert(10).unwrap();
        pool.remove(old).unwrap();
        let new = pool.insert(20).unwrap();

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(!pool.contains(old));
        assert_eq!(pool.get(old), None);
        assert_eq!(pool.get(new), Some(&20));
        assert!(pool.remove(old).is_err());
    }

    #[test]
    fn test_iteration_skips_empty_slots_in_order() {
        let mut pool = Pool::with_capacity(5);
        let handles: Vec<_> = (0..5).map(|i| pool.insert(i).unwrap()).collect();
        pool.remove(handles[1]).unwrap();
        pool.remove(handles[3]).unwrap();

        let seen: Vec<i32> = pool.values().copied().collect();
        assert_eq!(seen, vec![0, 2, 4]);
        // Restartable
        assert_eq!(pool.values().count(), 3);
    }

    #[test]
    fn test_marked_values_hidden_until_flush() {
        let mut pool = Pool::with_capacity(3);
        let a = pool.insert('a').unwrap();
        let b = pool.insert('b').unwrap();

        pool.mark_removed(a).unwrap();
        assert!(!pool.contains(a));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.values().copied().collect::<Vec<_>>(), vec!['b']);
        assert_eq!(pool.next_live(0), Some(b));

        // Slot stays taken until the flush
        let c = pool.insert('c').unwrap();
        assert_eq!(c.index(), 2);

        assert!(pool.mark_removed(a).is_err());
        assert_eq!(pool.flush_removed(), 1);
        assert_eq!(pool.insert('d').unwrap().index(), 0);
        assert_eq!(pool.flush_removed(), 0);
    }

    #[test]
    fn test_next_live_cursor_survives_mutation() {
        let mut pool = Pool::with_capacity(4);
        let a = pool.insert(0).unwrap();
        let b = pool.insert(1).unwrap();
        let c = pool.insert(2).unwrap();

        let mut visited = Vec::new();
        let mut cursor = 0;
        while let Some(h) = pool.next_live(cursor) {
            cursor = h.index() + 1;
            visited.push(h);
            if h == a {
                // Remove a peer we have not visited yet
                pool.mark_removed(b).unwrap();
            }
        }
        assert_eq!(visited, vec![a, c]);
    }

    proptest! {
        #[test]
        fn prop_len_tracks_inserts_minus_removes(ops in proptest::collection::vec((any::<bool>(), 0usize..8), 0..64)) {
            let mut pool = Pool::with_capacity(8);
            let mut live: Vec<Handle> = Vec::new();
            let mut inserted = 0usize;
            let mut removed = 0usize;

            for (is_insert, pick) in ops {
                if is_insert {
                    if let Some(h) = pool.insert(pick) {
                        live.push(h);
                        inserted += 1;
                    }
                } else if !live.is_empty() {
                    let h = live.swap_remove(pick % live.len());
                    prop_assert!(pool.remove(h).is_ok());
                    removed += 1;
                }
                prop_assert_eq!(pool.iter().count(), inserted - removed);
                prop_assert_eq!(pool.len(), inserted - removed);
            }

            // Iteration order is ascending slot order
            let indices: Vec<usize> = pool.iter().map(|(h, _)| h.index()).collect();
            let mut sorted = indices.clone();
            sorted.sort_unstable();
            prop_assert_eq!(indices, sorted);
        }
    }
}
