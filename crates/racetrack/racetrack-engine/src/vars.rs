//! The live `ShadowVar` table, keyed by memory-location identity.
//!
//! Mirrors `ThreadTable`'s per-entry locking shape: the outer table mutex
//! only guards insert/lookup, and each `ShadowVar` already does its own
//! internal locking for the FastTrack slow path.

use racetrack_clock::Epoch;
use racetrack_events::ObjectId;
use racetrack_sampling::AdaptiveSampler;
use racetrack_shadow::ShadowVar;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct VarTable {
    entries: Mutex<HashMap<ObjectId, Arc<ShadowVar>>>,
}

impl VarTable {
    pub fn new() -> Self {
        VarTable { entries: Mutex::new(HashMap::new()) }
    }

    /// The ShadowVar factory callback: a location's record is created on
    /// first observed access, seeded with `W = creator_epoch` if that
    /// first access is a write, else `R = creator_epoch`. Volatiles never
    /// reach this table — `Engine` routes them straight to the volatile
    /// clock table instead.
    pub fn get_or_create(
        &self,
        target: &ObjectId,
        is_write: bool,
        creator_epoch: Epoch,
        max_tid: usize,
        adaptive_params: Option<(u8, u8)>,
    ) -> Arc<ShadowVar> {
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(target.clone())
            .or_insert_with(|| {
                let sampler = adaptive_params.map(|(rate, threshold)| AdaptiveSampler::new(rate, threshold));
                let sx = if is_write {
                    ShadowVar::new_for_write(creator_epoch, max_tid, sampler)
                } else {
                    ShadowVar::new_for_read(creator_epoch, max_tid, sampler)
                };
                Arc::new(sx)
            })
            .clone()
    }
}

impl Default for VarTable {
    fn default() -> Self {
        Self::new()
    }
}
