//! The live `ShadowThread` table.
//!
//! Each thread's `(V, E)` is owned by that thread for the duration of its
//! lifetime; the table itself only needs a lock around lookup/insert/move,
//! not around the per-thread mutation, so each `ShadowThread` sits behind
//! its own `Mutex` inside an `Arc` rather than one mutex for the whole
//! table.
//!
//! Stopped threads move from `live` into `stopped` rather than being
//! dropped: a `Join` event can arrive after its joinee's `Stop` and still
//! needs to read the joinee's final `V` (the joinee is already terminated
//! by then, so no further tick is needed). A tid reused by a later
//! `NewThread` always gets a fresh entry in `live`, leaving the old
//! `stopped` record undisturbed for any `Join` still in flight against it.

use racetrack_clock::Tid;
use racetrack_shadow::{MaxEpochTable, ShadowThread};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct ThreadTable {
    live: Mutex<HashMap<Tid, Arc<Mutex<ShadowThread>>>>,
    stopped: Mutex<HashMap<Tid, Arc<Mutex<ShadowThread>>>>,
}

impl ThreadTable {
    pub fn new() -> Self {
        ThreadTable { live: Mutex::new(HashMap::new()), stopped: Mutex::new(HashMap::new()) }
    }

    /// `NewThread` handler. If the tid is already live (e.g. `Start`
    /// created it ahead of an explicit `NewThread`), this is a no-op — the
    /// slot already holds the correct freshly-initialized state.
    pub fn new_thread(&self, tid: Tid, max_epoch_per_tid: &MaxEpochTable) {
        self.get_or_create(tid, max_epoch_per_tid);
    }

    pub fn get_or_create(&self, tid: Tid, max_epoch_per_tid: &MaxEpochTable) -> Arc<Mutex<ShadowThread>> {
        let mut live = self.live.lock().unwrap();
        live.entry(tid)
            .or_insert_with(|| Arc::new(Mutex::new(ShadowThread::new_thread(tid, max_epoch_per_tid))))
            .clone()
    }

    /// Looks up a thread among the live set, then the stopped set (for a
    /// `Join` arriving after its joinee's `Stop`).
    pub fn get(&self, tid: Tid) -> Option<Arc<Mutex<ShadowThread>>> {
        if let Some(t) = self.live.lock().unwrap().get(&tid).cloned() {
            return Some(t);
        }
        self.stopped.lock().unwrap().get(&tid).cloned()
    }

    /// `Stop` handler: records the thread's final epoch into
    /// `maxEpochPerTid`, then moves it out of the live set so a
    /// later `NewThread` for the same (reused) tid starts fresh.
    pub fn stop(&self, tid: Tid, max_epoch_per_tid: &MaxEpochTable) {
        let removed = self.live.lock().unwrap().remove(&tid);
        if let Some(thread) = removed {
            {
                let t = thread.lock().unwrap();
                t.stop(max_epoch_per_tid);
            }
            self.stopped.lock().unwrap().insert(tid, thread);
        }
    }
}

impl Default for ThreadTable {
    fn default() -> Self {
        Self::new()
    }
}
