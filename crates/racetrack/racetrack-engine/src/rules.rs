//! FastTrack read/write decision rules.
//!
//! Fast paths never take the `ShadowVar`'s monitor; they only ever
//! short-circuit when the access provably repeats an already-recorded
//! epoch. Everything else falls through to the slow path, which re-reads
//! `W`/`R`/`CV` under the monitor and decides authoritatively. Races are
//! reported but never abort the update — the slow path's state change
//! still runs unconditionally so later accesses to the same location stay
//! analyzable.

use racetrack_events::SourceLocation;
use racetrack_report::{Counters, RaceKind, RaceReporter, Report, ReportDecision};
use racetrack_shadow::{ShadowThread, ShadowVar};
use std::sync::Arc;

pub struct AccessContext<'a> {
    pub target: &'a str,
    pub location: &'a SourceLocation,
    pub reporter: &'a Arc<dyn RaceReporter>,
    pub counters: &'a Counters,
}

pub fn handle_read(thread: &ShadowThread, sx: &ShadowVar, ctx: &AccessContext) {
    let e = thread.e;

    let r_fast = sx.fast_read();
    if r_fast == e {
        Counters::bump(&ctx.counters.read_same_epoch);
        return;
    }
    if r_fast.is_read_shared() && sx.cv_get(thread.tid) == e.clk() {
        Counters::bump(&ctx.counters.read_shared);
        return;
    }

    let guard = sx.lock();
    let w = guard.w();
    let r = guard.r();

    if w.tid() != thread.tid && !w.leq(&thread.v) {
        Counters::bump(&ctx.counters.write_read_race);
        report_race(sx, ctx, RaceKind::WriteRead, w.tid(), thread.tid, &format!("{w:?}"));
    }

    if !r.is_read_shared() {
        if r.tid() == thread.tid || r.leq(&thread.v) {
            guard.set_r(e);
            Counters::bump(&ctx.counters.read_exclusive);
        } else {
            guard.cv_set(r.tid(), r.clk());
            guard.cv_set(thread.tid, e.clk());
            guard.set_r(racetrack_clock::Epoch::READ_SHARED);
            Counters::bump(&ctx.counters.read_share);
        }
    } else {
        guard.cv_set(thread.tid, e.clk());
        Counters::bump(&ctx.counters.read_shared);
    }
}

pub fn handle_write(thread: &ShadowThread, sx: &ShadowVar, ctx: &AccessContext) {
    let e = thread.e;

    if sx.fast_write() == e {
        Counters::bump(&ctx.counters.write_same_epoch);
        return;
    }

    let guard = sx.lock();
    let w = guard.w();
    let r = guard.r();

    if w.tid() != thread.tid && !w.leq(&thread.v) {
        Counters::bump(&ctx.counters.write_write_race);
        report_race(sx, ctx, RaceKind::WriteWrite, w.tid(), thread.tid, &format!("{w:?}"));
    }

    if !r.is_read_shared() {
        if r.tid() != thread.tid && !r.leq(&thread.v) {
            Counters::bump(&ctx.counters.read_write_race);
            report_race(sx, ctx, RaceKind::ReadWrite, r.tid(), thread.tid, &format!("{r:?}"));
        } else {
            Counters::bump(&ctx.counters.write_exclusive);
        }
    } else if guard.cv_any_gt(&thread.v) {
        let mut start = 0;
        while let Some(prev_reader) = guard.cv_next_gt(&thread.v, start) {
            Counters::bump(&ctx.counters.read_shared_write_race);
            report_race(
                sx,
                ctx,
                RaceKind::ReadSharedWrite,
                prev_reader,
                thread.tid,
                &format!("CV[{prev_reader}]={}", guard.cv_get(prev_reader)),
            );
            start = prev_reader + 1;
        }
    } else {
        Counters::bump(&ctx.counters.write_shared);
    }

    guard.set_w(e);
}

fn report_race(
    sx: &ShadowVar,
    ctx: &AccessContext,
    kind: RaceKind,
    prev_tid: racetrack_clock::Tid,
    cur_tid: racetrack_clock::Tid,
    shadow_state_dump: &str,
) {
    if sx.is_advanced() {
        return;
    }
    let decision = ctx.reporter.report(Report {
        kind,
        description: format!("{kind} race on {} between tid {prev_tid} and tid {cur_tid}", ctx.target),
        prev_op_tid: prev_tid,
        cur_op_tid: cur_tid,
        shadow_state_dump: shadow_state_dump.to_string(),
        thread_dump: format!("tid {cur_tid}"),
        location: ctx.location.clone(),
        stack: Vec::new(),
    });
    if decision == ReportDecision::Advance {
        sx.set_advanced();
    }
}
