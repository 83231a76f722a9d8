//! Synchronization-event handlers.
//!
//! Each function is the clock transformation for one event kind, taking
//! the mutex-protected state it needs already locked by the caller
//! (`Engine`), which is responsible for picking the right table and lock
//! ordering — the core never holds two of these monitors simultaneously.

use racetrack_clock::VectorClock;
use racetrack_shadow::{BarrierState, ShadowThread};

pub fn acquire(thread: &mut ShadowThread, lock_clock: &VectorClock) {
    thread.v.max(lock_clock);
    thread.refresh_epoch();
}

pub fn release(thread: &mut ShadowThread, lock_clock: &mut VectorClock) {
    lock_clock.max(&thread.v);
    thread.v.tick(thread.tid);
    thread.refresh_epoch();
}

pub fn fork(parent: &mut ShadowThread, child: &mut ShadowThread) {
    child.v.max(&parent.v);
    child.v.tick(child.tid);
    child.refresh_epoch();
    parent.v.tick(parent.tid);
    parent.refresh_epoch();
}

/// `joinee` is terminated by the time this runs; no tick needed.
pub fn join(joiner: &mut ShadowThread, joinee_v: &VectorClock) {
    joiner.v.max(joinee_v);
    joiner.refresh_epoch();
}

pub fn wait_pre(thread: &mut ShadowThread, monitor_clock: &mut VectorClock) {
    release(thread, monitor_clock);
}

pub fn wait_post(thread: &mut ShadowThread, monitor_clock: &VectorClock) {
    acquire(thread, monitor_clock);
}

pub fn volatile_write(thread: &mut ShadowThread, vol_clock: &mut VectorClock) {
    vol_clock.max(&thread.v);
    thread.v.tick(thread.tid);
    thread.refresh_epoch();
}

pub fn volatile_read(thread: &mut ShadowThread, vol_clock: &VectorClock) {
    thread.v.max(vol_clock);
    thread.refresh_epoch();
}

pub fn barrier_enter(thread: &ShadowThread, barrier: &BarrierState) {
    barrier.enter(&thread.v);
}

pub fn barrier_exit(thread: &mut ShadowThread, accumulator: &VectorClock) {
    thread.v.max(accumulator);
    thread.v.tick(thread.tid);
    thread.refresh_epoch();
}

pub fn class_initialized(thread: &mut ShadowThread, class_clock: &mut VectorClock) {
    class_clock.copy(&thread.v);
    thread.v.tick(thread.tid);
    thread.refresh_epoch();
}

pub fn class_accessed(thread: &mut ShadowThread, class_clock: &VectorClock) {
    thread.v.max(class_clock);
    thread.refresh_epoch();
}

#[cfg(test)]
mod tests {
    use super::*;
    use racetrack_shadow::MaxEpochTable;

    #[test]
    fn acquire_then_release_propagates_happens_before() {
        let table = MaxEpochTable::new(4);
        let mut writer = ShadowThread::new_thread(0, &table);
        let write_epoch = writer.e.clk();
        let mut lock_clock = VectorClock::new();

        release(&mut writer, &mut lock_clock);

        let mut reader = ShadowThread::new_thread(1, &table);
        acquire(&mut reader, &lock_clock);

        // The published lock clock carries the epoch the critical section
        // ran at, not the post-release ticked value.
        assert!(reader.v.get(0) >= write_epoch);
    }

    #[test]
    fn fork_propagates_parent_clock_to_child_and_ticks_both() {
        let table = MaxEpochTable::new(4);
        let mut parent = ShadowThread::new_thread(0, &table);
        let mut child = ShadowThread::new_thread(1, &table);
        let parent_clk_before = parent.e.clk();

        fork(&mut parent, &mut child);

        assert_eq!(child.v.get(0), parent_clk_before);
        assert!(parent.e.clk() > parent_clk_before);
    }

    #[test]
    fn join_propagates_joinee_clock_into_joiner() {
        let table = MaxEpochTable::new(4);
        let mut joinee = ShadowThread::new_thread(1, &table);
        joinee.v.tick(1);
        joinee.refresh_epoch();

        let mut joiner = ShadowThread::new_thread(0, &table);
        join(&mut joiner, &joinee.v);

        assert_eq!(joiner.v.get(1), joinee.e.clk());
    }

    #[test]
    fn barrier_round_propagates_every_participant_to_every_other() {
        let barrier = BarrierState::new();
        let table = MaxEpochTable::new(4);
        let mut t0 = ShadowThread::new_thread(0, &table);
        let mut t1 = ShadowThread::new_thread(1, &table);
        let t0_clk_before = t0.e.clk();
        let t1_clk_before = t1.e.clk();

        barrier_enter(&t0, &barrier);
        barrier_enter(&t1, &barrier);
        let snapshot = barrier.exit();

        barrier_exit(&mut t0, &snapshot);
        barrier_exit(&mut t1, &snapshot);

        assert!(t0.v.get(1) >= t1_clk_before);
        assert!(t1.v.get(0) >= t0_clk_before);
    }
}
