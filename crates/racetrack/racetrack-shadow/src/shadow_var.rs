//! Per-memory-location shadow state.
//!
//! Holds the data a `ShadowVar` needs; the FastTrack decision rules that
//! read and mutate it live in `racetrack-engine`, which takes the monitor
//! lock for the slow path. `W` and `R` are plain `AtomicU64`s so the fast
//! path can peek at them with a relaxed load before deciding whether to
//! take the monitor at all.

use racetrack_clock::{AtomicVectorClock, Epoch};
use racetrack_sampling::AdaptiveSampler;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A memory location's shadow record.
pub struct ShadowVar {
    w: AtomicU64,
    r: AtomicU64,
    /// `CV[t]` = last-read epoch's clock by tid `t`, meaningful only once
    /// `r` holds `Epoch::READ_SHARED`. Lock-free so the fast path's
    /// "ReadShared Same Epoch" check never takes the monitor.
    cv: AtomicVectorClock,
    /// The ShadowVar's monitor: serializes the slow path's
    /// re-read-then-decide-then-mutate sequence across racing threads.
    monitor: Mutex<()>,
    /// Present only under the `ADAPTIVE` sampling scheme; `None` means
    /// sampling is decided globally (`COUNT`) or not at all.
    adaptive_sampler: Option<AdaptiveSampler>,
    /// Set once the reporter tells the engine this site is no longer
    /// interesting ("advance"); gates future *reporting* only, never the
    /// state update that keeps the site analyzable.
    advanced: std::sync::atomic::AtomicBool,
}

/// A guard returned by [`ShadowVar::lock`], giving authoritative
/// (non-fast-path) access to `W`, `R`, and `CV` under the monitor.
pub struct ShadowVarGuard<'a> {
    var: &'a ShadowVar,
    _held: std::sync::MutexGuard<'a, ()>,
}

impl ShadowVar {
    fn new(w: Epoch, r: Epoch, max_tid: usize, adaptive_sampler: Option<AdaptiveSampler>) -> Self {
        ShadowVar {
            w: AtomicU64::new(w.to_raw()),
            r: AtomicU64::new(r.to_raw()),
            cv: AtomicVectorClock::with_capacity(max_tid),
            monitor: Mutex::new(()),
            adaptive_sampler,
            advanced: std::sync::atomic::AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_advanced(&self) -> bool {
        self.advanced.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_advanced(&self) {
        self.advanced.store(true, Ordering::Relaxed);
    }

    /// Factory for a location whose first observed access is a write.
    pub fn new_for_write(creator_epoch: Epoch, max_tid: usize, adaptive: Option<AdaptiveSampler>) -> Self {
        Self::new(creator_epoch, Epoch::ZERO, max_tid, adaptive)
    }

    /// Factory for a location whose first observed access is a read.
    pub fn new_for_read(creator_epoch: Epoch, max_tid: usize, adaptive: Option<AdaptiveSampler>) -> Self {
        Self::new(Epoch::ZERO, creator_epoch, max_tid, adaptive)
    }

    #[inline]
    pub fn fast_read(&self) -> Epoch {
        Epoch::from_raw(self.r.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn fast_write(&self) -> Epoch {
        Epoch::from_raw(self.w.load(Ordering::Relaxed))
    }

    /// Lock-free read of `CV[tid]`'s clock value, for the fast path's
    /// "ReadShared Same Epoch" check.
    #[inline]
    pub fn cv_get(&self, tid: racetrack_clock::Tid) -> u64 {
        self.cv.get(tid)
    }

    pub fn adaptive_sampler(&self) -> Option<&AdaptiveSampler> {
        self.adaptive_sampler.as_ref()
    }

    /// Takes the ShadowVar's monitor for the slow path.
    pub fn lock(&self) -> ShadowVarGuard<'_> {
        ShadowVarGuard { var: self, _held: self.monitor.lock().unwrap() }
    }
}

impl<'a> ShadowVarGuard<'a> {
    #[inline]
    pub fn w(&self) -> Epoch {
        Epoch::from_raw(self.var.w.load(Ordering::Acquire))
    }

    #[inline]
    pub fn r(&self) -> Epoch {
        Epoch::from_raw(self.var.r.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_w(&self, e: Epoch) {
        self.var.w.store(e.to_raw(), Ordering::Release);
    }

    #[inline]
    pub fn set_r(&self, e: Epoch) {
        self.var.r.store(e.to_raw(), Ordering::Release);
    }

    #[inline]
    pub fn cv_get(&self, tid: racetrack_clock::Tid) -> u64 {
        self.var.cv.get(tid)
    }

    #[inline]
    pub fn cv_set(&self, tid: racetrack_clock::Tid, v: u64) {
        self.var.cv.set(tid, v);
    }

    pub fn cv_capacity(&self) -> usize {
        self.var.cv.capacity()
    }

    #[inline]
    pub fn cv_any_gt(&self, other: &racetrack_clock::VectorClock) -> bool {
        self.var.cv.any_gt(other)
    }

    #[inline]
    pub fn cv_next_gt(&self, other: &racetrack_clock::VectorClock, start: racetrack_clock::Tid) -> Option<racetrack_clock::Tid> {
        self.var.cv.next_gt(other, start)
    }
}
