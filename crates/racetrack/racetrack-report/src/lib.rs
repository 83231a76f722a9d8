//! Race reports, the reporter trait boundary, default sinks, and the
//! observability counters.

pub mod counters;
pub mod report;
pub mod sinks;

pub use counters::Counters;
pub use report::{RaceKind, RaceReporter, Report, ReportDecision};
pub use sinks::{ChannelReporter, CountingReporter};
