//! Default `RaceReporter` implementations.

use crate::report::{RaceReporter, Report, ReportDecision};
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Access-site identity: source location, the two racing tids, and the
/// race kind as a tag.
type SiteKey = (String, u32, racetrack_clock::Tid, racetrack_clock::Tid, &'static str);

/// De-duplicates by access-site identity, so each race site is reported
/// once, and logs every first-seen race at `warn!`, matching the
/// logging-at-lifecycle-boundaries style used throughout this crate's
/// binaries.
#[derive(Default)]
pub struct CountingReporter {
    seen: Mutex<HashSet<SiteKey>>,
}

impl CountingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RaceReporter for CountingReporter {
    fn report(&self, report: Report) -> ReportDecision {
        let key = (
            report.location.file.clone(),
            report.location.line,
            report.prev_op_tid,
            report.cur_op_tid,
            match report.kind {
                crate::report::RaceKind::WriteRead => "write_read",
                crate::report::RaceKind::ReadWrite => "read_write",
                crate::report::RaceKind::WriteWrite => "write_write",
                crate::report::RaceKind::ReadSharedWrite => "read_shared_write",
            },
        );
        let mut seen = self.seen.lock().unwrap();
        if seen.insert(key) {
            tracing::warn!(
                kind = %report.kind,
                prev = report.prev_op_tid,
                cur = report.cur_op_tid,
                location = %report.location,
                "{}",
                report.description
            );
            ReportDecision::Continue
        } else {
            // Already reported from this site; tell the engine it may stop.
            ReportDecision::Advance
        }
    }
}

/// Forwards every report to a consumer thread over a channel. Reports are
/// low-rate control-plane traffic, not a hot-path data feed, so a plain
/// mpsc channel suffices where a hot path would reach for a shared-memory
/// ring.
pub struct ChannelReporter {
    tx: Sender<Report>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<Report>) -> Self {
        ChannelReporter { tx }
    }
}

impl RaceReporter for ChannelReporter {
    fn report(&self, report: Report) -> ReportDecision {
        // A disconnected receiver means no one is listening anymore;
        // there is nothing left to advance or retry.
        let _ = self.tx.send(report);
        ReportDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RaceKind;
    use racetrack_events::SourceLocation;

    fn sample_report() -> Report {
        Report {
            kind: RaceKind::WriteRead,
            description: "test race".into(),
            prev_op_tid: 0,
            cur_op_tid: 1,
            shadow_state_dump: String::new(),
            thread_dump: String::new(),
            location: SourceLocation { file: "Foo.java".into(), line: 1 },
            stack: Vec::new(),
        }
    }

    #[test]
    fn counting_reporter_dedups_by_site() {
        let r = CountingReporter::new();
        assert_eq!(r.report(sample_report()), ReportDecision::Continue);
        assert_eq!(r.report(sample_report()), ReportDecision::Advance);
    }
}
