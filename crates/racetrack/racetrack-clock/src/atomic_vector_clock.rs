//! Fixed-capacity, lock-free vector clock used for a `ShadowVar`'s shared
//! read clock (`CV`), which the FastTrack fast path must be able to
//! consult without taking the `ShadowVar`'s monitor for the
//! "ReadShared Same Epoch" check.
//!
//! Capacity is fixed at construction to `max_tid` (the engine's config
//! sizes this), so entries can be plain `AtomicU64`s instead of something
//! that needs to grow behind a lock. A
//! tid at or beyond `max_tid` is a configuration mistake, not a runtime
//! condition to recover from — see `racetrack-engine`'s handling of
//! `NewThread` beyond the configured bound.

use crate::epoch::Tid;
use crate::vector_clock::VectorClock;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct AtomicVectorClock {
    entries: Box<[AtomicU64]>,
}

impl AtomicVectorClock {
    pub fn with_capacity(max_tid: usize) -> Self {
        let entries = (0..max_tid).map(|_| AtomicU64::new(0)).collect();
        AtomicVectorClock { entries }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Relaxed load: safe to call without the owning `ShadowVar`'s monitor.
    /// A torn read relative to a concurrent `set` just means the fast path
    /// falls through to the authoritative slow path.
    #[inline]
    pub fn get(&self, tid: Tid) -> u64 {
        match self.entries.get(tid as usize) {
            Some(cell) => cell.load(Ordering::Relaxed),
            None => 0,
        }
    }

    /// Must only be called while holding the owning `ShadowVar`'s monitor:
    /// all updates to a given `ShadowVar`'s `W`, `R`, and `CV` happen under
    /// that `ShadowVar`'s monitor.
    #[inline]
    pub fn set(&self, tid: Tid, v: u64) {
        match self.entries.get(tid as usize) {
            Some(cell) => cell.store(v, Ordering::Relaxed),
            None => panic!(
                "tid {tid} exceeds configured max_tid ({}); increase max_tid",
                self.entries.len()
            ),
        }
    }

    /// Does any entry exceed `other`'s corresponding entry? Must be called
    /// under the owning `ShadowVar`'s monitor, as part of the write slow
    /// path.
    pub fn any_gt(&self, other: &VectorClock) -> bool {
        for (tid, cell) in self.entries.iter().enumerate() {
            if cell.load(Ordering::Relaxed) > other.get(tid as Tid) {
                return true;
            }
        }
        false
    }

    /// Smallest `tid >= start` whose entry exceeds `other`'s, used to
    /// enumerate racing shared-readers in ascending order.
    pub fn next_gt(&self, other: &VectorClock, start: Tid) -> Option<Tid> {
        for tid in start as usize..self.entries.len() {
            if self.entries[tid].load(Ordering::Relaxed) > other.get(tid as Tid) {
                return Some(tid as Tid);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_zero_and_stores() {
        let cv = AtomicVectorClock::with_capacity(8);
        assert_eq!(cv.get(3), 0);
        cv.set(3, 42);
        assert_eq!(cv.get(3), 42);
    }

    #[test]
    #[should_panic(expected = "exceeds configured max_tid")]
    fn set_beyond_capacity_panics() {
        let cv = AtomicVectorClock::with_capacity(2);
        cv.set(5, 1);
    }
}
