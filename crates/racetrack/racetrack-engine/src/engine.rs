//! The assembled engine: one event-kind dispatcher over the shadow-state
//! tables, the sampling controller, and the reporter.

use crate::threads::ThreadTable;
use crate::vars::VarTable;
use crate::{rules, sync_handlers};
use racetrack_clock::Tid;
use racetrack_config::{EngineConfig, SamplingSchemeKind};
use racetrack_events::{AccessKind, Event, ObjectId};
use racetrack_report::{Counters, RaceReporter};
use racetrack_sampling::SamplingScheme;
use racetrack_shadow::{BarrierTable, MaxEpochTable, ShadowThread, SyncTable};
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-wide engine context, passed around as one object rather than
/// ambient statics: owns every shared table plus the reporter and
/// aggregated counters.
pub struct Engine {
    config: EngineConfig,
    threads: ThreadTable,
    max_epoch_per_tid: MaxEpochTable,
    vars: VarTable,
    locks: SyncTable,
    volatiles: SyncTable,
    classes: SyncTable,
    barriers: BarrierTable,
    sampling: SamplingScheme,
    reporter: Arc<dyn RaceReporter>,
    pub counters: Counters,
}

impl Engine {
    pub fn new(config: EngineConfig, reporter: Arc<dyn RaceReporter>) -> Self {
        let sampling = match config.sampling_scheme {
            SamplingSchemeKind::Count => SamplingScheme::count(config.sampling_rate),
            SamplingSchemeKind::Adaptive => {
                SamplingScheme::adaptive(config.sampling_rate, config.adaptive_threshold)
            }
        };
        let max_epoch_per_tid = MaxEpochTable::new(config.max_tid);
        Engine {
            threads: ThreadTable::new(),
            max_epoch_per_tid,
            vars: VarTable::new(),
            locks: SyncTable::new(),
            volatiles: SyncTable::new(),
            classes: SyncTable::new(),
            barriers: BarrierTable::new(),
            sampling,
            reporter,
            counters: Counters::new(),
            config,
        }
    }

    pub fn handle_event(&self, event: Event) {
        match event {
            Event::NewThread { tid } => {
                tracing::debug!(tid, "new thread");
                self.threads.new_thread(tid, &self.max_epoch_per_tid);
            }
            Event::Start { parent, child } => {
                self.handle_fork(parent, child);
                Counters::bump(&self.counters.fork);
            }
            Event::Join { joiner, joinee } => {
                self.handle_join(joiner, joinee);
                Counters::bump(&self.counters.join);
            }
            Event::Stop { tid } => {
                tracing::debug!(tid, "thread stop");
                self.threads.stop(tid, &self.max_epoch_per_tid);
            }
            Event::Access { access_kind, is_write, tid, target, location } => match &access_kind {
                AccessKind::Volatile => self.handle_volatile(tid, &target, is_write),
                AccessKind::StaticField { class } => {
                    let ctx = rules::AccessContext {
                        target: &target,
                        location: &location,
                        reporter: &self.reporter,
                        counters: &self.counters,
                    };
                    self.handle_access(tid, &target, is_write, Some(class), &ctx);
                }
                AccessKind::Field | AccessKind::Array => {
                    let ctx = rules::AccessContext {
                        target: &target,
                        location: &location,
                        reporter: &self.reporter,
                        counters: &self.counters,
                    };
                    self.handle_access(tid, &target, is_write, None, &ctx);
                }
            },
            Event::Acquire { lock, tid } => {
                self.handle_acquire(&lock, tid);
                Counters::bump(&self.counters.acquire);
            }
            Event::Release { lock, tid } => {
                self.handle_release(&lock, tid);
                Counters::bump(&self.counters.release);
            }
            Event::PreWait { tid, monitor } => {
                self.handle_wait_pre(&monitor, tid);
                Counters::bump(&self.counters.wait);
            }
            Event::PostWait { tid, monitor } => {
                self.handle_wait_post(&monitor, tid);
                Counters::bump(&self.counters.wait);
            }
            Event::PreNotify { .. } | Event::PostNotify { .. } => {
                Counters::bump(&self.counters.other);
            }
            Event::BarrierEnter { barrier, tid } => {
                self.handle_barrier_enter(&barrier, tid);
                Counters::bump(&self.counters.barrier);
            }
            Event::BarrierExit { barrier, tid } => {
                self.handle_barrier_exit(&barrier, tid);
                Counters::bump(&self.counters.barrier);
            }
            Event::ClassInitialized { class, tid } => {
                self.handle_class_initialized(&class, tid);
                Counters::bump(&self.counters.other);
            }
            Event::ClassAccessed { class, tid } => {
                self.handle_class_accessed(&class, tid);
                Counters::bump(&self.counters.other);
            }
        }
    }

    fn thread(&self, tid: Tid) -> Arc<Mutex<ShadowThread>> {
        self.threads.get_or_create(tid, &self.max_epoch_per_tid)
    }

    fn handle_access(
        &self,
        tid: Tid,
        target: &ObjectId,
        is_write: bool,
        static_class: Option<&ObjectId>,
        ctx: &rules::AccessContext<'_>,
    ) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();

        let adaptive_params = self.sampling.adaptive_params();
        let sx = self.vars.get_or_create(target, is_write, thread.e, self.config.max_tid, adaptive_params);

        let included = match self.sampling.include_global() {
            Some(included) => included,
            None => sx
                .adaptive_sampler()
                .expect("adaptive sampling scheme configured but ShadowVar has no sampler")
                .include(),
        };
        if !included {
            return;
        }

        if let Some(class) = static_class {
            self.classes.with(class, |class_clock| sync_handlers::class_accessed(&mut thread, class_clock));
        }

        if is_write {
            rules::handle_write(&thread, &sx, ctx);
        } else {
            rules::handle_read(&thread, &sx, ctx);
        }
    }

    fn handle_volatile(&self, tid: Tid, target: &ObjectId, is_write: bool) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        self.volatiles.with(target, |vol_clock| {
            if is_write {
                sync_handlers::volatile_write(&mut thread, vol_clock);
            } else {
                sync_handlers::volatile_read(&mut thread, vol_clock);
            }
        });
        Counters::bump(&self.counters.volatile);
    }

    fn handle_acquire(&self, lock: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        self.locks.with(lock, |lock_clock| sync_handlers::acquire(&mut thread, lock_clock));
    }

    fn handle_release(&self, lock: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        self.locks.with(lock, |lock_clock| sync_handlers::release(&mut thread, lock_clock));
    }

    fn handle_wait_pre(&self, monitor: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        self.locks.with(monitor, |monitor_clock| sync_handlers::wait_pre(&mut thread, monitor_clock));
    }

    fn handle_wait_post(&self, monitor: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        self.locks.with(monitor, |monitor_clock| sync_handlers::wait_post(&mut thread, monitor_clock));
    }

    fn handle_barrier_enter(&self, barrier: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let thread = thread_arc.lock().unwrap();
        let state = self.barriers.get_or_create(barrier);
        sync_handlers::barrier_enter(&thread, &state);
    }

    fn handle_barrier_exit(&self, barrier: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        let state = self.barriers.get_or_create(barrier);
        let accumulator = state.exit();
        sync_handlers::barrier_exit(&mut thread, &accumulator);
    }

    fn handle_class_initialized(&self, class: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        self.classes.with(class, |class_clock| sync_handlers::class_initialized(&mut thread, class_clock));
    }

    fn handle_class_accessed(&self, class: &ObjectId, tid: Tid) {
        let thread_arc = self.thread(tid);
        let mut thread = thread_arc.lock().unwrap();
        self.classes.with(class, |class_clock| sync_handlers::class_accessed(&mut thread, class_clock));
    }

    fn handle_fork(&self, parent: Tid, child: Tid) {
        let parent_arc = self.thread(parent);
        let child_arc = self.thread(child);
        let (mut p, mut c) = lock_pair(parent, &parent_arc, child, &child_arc);
        sync_handlers::fork(&mut p, &mut c);
    }

    fn handle_join(&self, joiner: Tid, joinee: Tid) {
        let joiner_arc = self.thread(joiner);
        let joinee_arc = self
            .threads
            .get(joinee)
            .unwrap_or_else(|| panic!("Join referenced tid {joinee} with no NewThread on record"));
        let (mut jr, je) = lock_pair(joiner, &joiner_arc, joinee, &joinee_arc);
        sync_handlers::join(&mut jr, &je.v);
    }
}

/// Locks two distinct threads' state in ascending-tid order, so `Fork` and
/// `Join` (the only handlers that touch two `ShadowThread`s at once) never
/// deadlock against each other regardless of which tid is numerically
/// first in the event.
fn lock_pair<'a>(
    a_tid: Tid,
    a: &'a Arc<Mutex<ShadowThread>>,
    b_tid: Tid,
    b: &'a Arc<Mutex<ShadowThread>>,
) -> (MutexGuard<'a, ShadowThread>, MutexGuard<'a, ShadowThread>) {
    if a_tid <= b_tid {
        let ga = a.lock().unwrap();
        let gb = b.lock().unwrap();
        (ga, gb)
    } else {
        let gb = b.lock().unwrap();
        let ga = a.lock().unwrap();
        (ga, gb)
    }
}
