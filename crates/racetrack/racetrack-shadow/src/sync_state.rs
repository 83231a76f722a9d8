//! Sync-object state: clocks attached to locks, volatiles, and classes,
//! plus barrier accumulator state.
//!
//! Lock/volatile/class clocks are created lazily on first use. Lock-state
//! mutation is implicitly serialized by the application holding the real
//! lock; the table wrapping these clocks still needs its own mutex because
//! *different* locks share one table, and inserting a fresh entry for a
//! never-seen lock must not race with a lookup of an existing one.

use racetrack_clock::VectorClock;
use std::collections::HashMap;
use std::sync::Mutex;

pub type ObjectId = String;

/// A table of per-object vector clocks (one lock table, one volatile
/// table, one class-init table), each guarded by its own monitor — the
/// core never holds two of these monitors simultaneously.
pub struct SyncTable {
    entries: Mutex<HashMap<ObjectId, VectorClock>>,
}

impl SyncTable {
    pub fn new() -> Self {
        SyncTable { entries: Mutex::new(HashMap::new()) }
    }

    /// Runs `f` against the object's clock, creating a zeroed one on first
    /// use: sync-object states are created lazily, not pre-registered.
    pub fn with<R>(&self, id: &ObjectId, f: impl FnOnce(&mut VectorClock) -> R) -> R {
        let mut entries = self.entries.lock().unwrap();
        let vc = entries.entry(id.clone()).or_default();
        f(vc)
    }

    /// Drops an object's clock; a sync object's shadow state is destroyed
    /// with its referent. Unused by the replay CLI (traces never signal
    /// lock/class/volatile destruction) but kept for a future collaborator
    /// that does.
    pub fn remove(&self, id: &ObjectId) {
        self.entries.lock().unwrap().remove(id);
    }
}

impl Default for SyncTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One round of barrier participation: an accumulating clock, maxed with
/// every arriving thread's `V`, handed back (maxed into each thread's `V`)
/// at barrier exit.
///
/// Every participant's `exit()` in a round must observe the full
/// accumulator, not just the first caller, so the reset can't happen
/// eagerly inside `exit()` itself — a round is only recycled lazily, the
/// next time `enter()` is called after the round has been exited at least
/// once. This assumes a round's `enter()` calls all precede its `exit()`
/// calls, which holds for any barrier actually used as a rendezvous.
pub struct BarrierState {
    round: Mutex<BarrierRound>,
}

struct BarrierRound {
    clock: VectorClock,
    exited: bool,
}

impl BarrierState {
    pub fn new() -> Self {
        BarrierState { round: Mutex::new(BarrierRound { clock: VectorClock::new(), exited: false }) }
    }

    /// Barrier-enter: max the round accumulator with the arriving thread's
    /// `V`.
    pub fn enter(&self, v: &VectorClock) {
        let mut round = self.round.lock().unwrap();
        if round.exited {
            *round = BarrierRound { clock: VectorClock::new(), exited: false };
        }
        round.clock.max(v);
    }

    /// Barrier-exit: returns a snapshot of the accumulator for the caller
    /// to max into its own `V`. The round is marked exited
    /// so the next `enter()` starts a fresh one, but the accumulator
    /// itself is left intact for any other participant still exiting this
    /// round.
    pub fn exit(&self) -> VectorClock {
        let mut round = self.round.lock().unwrap();
        round.exited = true;
        round.clock.clone()
    }
}

impl Default for BarrierState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BarrierTable {
    barriers: Mutex<HashMap<ObjectId, std::sync::Arc<BarrierState>>>,
}

impl BarrierTable {
    pub fn new() -> Self {
        BarrierTable { barriers: Mutex::new(HashMap::new()) }
    }

    pub fn get_or_create(&self, id: &ObjectId) -> std::sync::Arc<BarrierState> {
        let mut barriers = self.barriers.lock().unwrap();
        barriers.entry(id.clone()).or_insert_with(|| std::sync::Arc::new(BarrierState::new())).clone()
    }
}

impl Default for BarrierTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_table_creates_lazily() {
        let t = SyncTable::new();
        t.with(&"L".to_string(), |vc| vc.set(0, 3));
        let v = t.with(&"L".to_string(), |vc| vc.get(0));
        assert_eq!(v, 3);
    }

    #[test]
    fn barrier_round_resets_after_exit() {
        let b = BarrierState::new();
        let mut v0 = VectorClock::new();
        v0.set(0, 5);
        b.enter(&v0);
        let snapshot = b.exit();
        assert_eq!(snapshot.get(0), 5);

        let mut v1 = VectorClock::new();
        v1.set(1, 9);
        b.enter(&v1);
        let next_snapshot = b.exit();
        // fresh round: does not carry over thread 0's contribution
        assert_eq!(next_snapshot.get(0), 0);
        assert_eq!(next_snapshot.get(1), 9);
    }
}
