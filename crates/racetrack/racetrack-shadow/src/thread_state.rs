//! Per-thread shadow state and the process-wide tid-reuse table
//! (`maxEpochPerTid`).

use racetrack_clock::{Epoch, Tid, VectorClock};
use std::sync::Mutex;

/// A thread's vector clock `V` and current epoch `E`.
///
/// Invariant: `E == V.get(tid)` at every observation point. Mutated only
/// by the owning thread, except the two documented fork/join exceptions,
/// both of which are safe because the runtime serializes them with the
/// owning thread's lifecycle.
pub struct ShadowThread {
    pub tid: Tid,
    pub v: VectorClock,
    pub e: Epoch,
}

impl ShadowThread {
    /// `NewThread` handler: `V` starts at all zeros, then the tid's own
    /// entry is set one past the highest epoch ever assigned to this
    /// (possibly reused) tid, then ticked once more so `E == V.get(tid)`
    /// holds immediately.
    pub fn new_thread(tid: Tid, max_epoch_per_tid: &MaxEpochTable) -> Self {
        let mut v = VectorClock::new();
        let base = max_epoch_per_tid.get(tid);
        v.set(tid, base + 1);
        let clk = v.tick(tid);
        ShadowThread { tid, v, e: Epoch::make(tid, clk) }
    }

    /// Re-reads `E` from `V` after a mutation to `V[tid]`, preserving the
    /// `E == V.get(tid)` invariant.
    #[inline]
    pub fn refresh_epoch(&mut self) {
        self.e = Epoch::make(self.tid, self.v.get(self.tid));
    }

    /// `Stop` handler: records the final epoch so a reused tid starts
    /// strictly above it.
    pub fn stop(&self, max_epoch_per_tid: &MaxEpochTable) {
        max_epoch_per_tid.record(self.tid, self.e.clk());
    }
}

/// Process-wide `maxEpochPerTid`, guarded by its own singleton monitor.
/// Sized to `max_tid` from `racetrack-config::EngineConfig`.
pub struct MaxEpochTable {
    entries: Mutex<Vec<u64>>,
}

impl MaxEpochTable {
    pub fn new(max_tid: usize) -> Self {
        MaxEpochTable { entries: Mutex::new(vec![0; max_tid])}
    }

    pub fn get(&self, tid: Tid) -> u64 {
        let entries = self.entries.lock().unwrap();
        entries.get(tid as usize).copied().unwrap_or(0)
    }

    /// `maxEpochPerTid[tid] = max(maxEpochPerTid[tid], clk)` — the table
    /// only ever grows per-tid.
    pub fn record(&self, tid: Tid, clk: u64) {
        let mut entries = self.entries.lock().unwrap();
        if tid as usize >= entries.len() {
            entries.resize(tid as usize + 1, 0);
        }
        let slot = &mut entries[tid as usize];
        if clk > *slot {
            *slot = clk;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e_equals_v_get_tid_on_new_thread() {
        let table = MaxEpochTable::new(4);
        let t = ShadowThread::new_thread(2, &table);
        assert_eq!(t.e, Epoch::make(2, t.v.get(2)));
    }

    #[test]
    fn reused_tid_starts_above_prior_max() {
        let table = MaxEpochTable::new(4);
        let t1 = ShadowThread::new_thread(1, &table);
        t1.stop(&table);
        let recorded = t1.e.clk();

        let t1_again = ShadowThread::new_thread(1, &table);
        assert!(t1_again.e.clk() > recorded);
    }

    #[test]
    fn max_epoch_table_never_decreases() {
        let table = MaxEpochTable::new(4);
        table.record(0, 10);
        table.record(0, 5);
        assert_eq!(table.get(0), 10);
    }
}
