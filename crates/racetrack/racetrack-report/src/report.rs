//! Race reports and the reporter boundary.

use racetrack_clock::Tid;
use racetrack_events::SourceLocation;

/// Which FastTrack invariant an access pair violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceKind {
    WriteRead,
    ReadWrite,
    WriteWrite,
    ReadSharedWrite,
}

impl std::fmt::Display for RaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RaceKind::WriteRead => "Write-Read",
            RaceKind::ReadWrite => "Read-Write",
            RaceKind::WriteWrite => "Write-Write",
            RaceKind::ReadSharedWrite => "Read(Shared)-Write",
        };
        f.write_str(s)
    }
}

/// A single race report.
#[derive(Clone, Debug)]
pub struct Report {
    pub kind: RaceKind,
    pub description: String,
    pub prev_op_tid: Tid,
    pub cur_op_tid: Tid,
    pub shadow_state_dump: String,
    pub thread_dump: String,
    pub location: SourceLocation,
    pub stack: Vec<String>,
}

/// What the reporter wants the engine to do about future accesses to the
/// same site: whether to "advance" past it, letting the core stop
/// reporting from that site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportDecision {
    /// Keep evaluating and reporting this site in the future.
    Continue,
    /// This site is no longer interesting; the engine may suppress future
    /// reports for it.
    Advance,
}

/// The boundary to external collaborators: the core invokes this with
/// each violation it finds. De-duplication policy is the reporter's
/// business, not the rule engine's.
pub trait RaceReporter: Send + Sync {
    fn report(&self, report: Report) -> ReportDecision;
}
