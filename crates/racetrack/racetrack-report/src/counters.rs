//! Per-rule-outcome observability counters, aggregated at process exit.
//!
//! Follows the plain-data summary-on-demand pattern used throughout this
//! workspace's benchmarking code, rather than a metrics-export
//! integration.

use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! counters {
    ($($field:ident => $label:literal),+ $(,)?) => {
        /// Rule-outcome and event-kind counters.
        #[derive(Default)]
        pub struct Counters {
            $(pub $field: AtomicU64,)+
        }

        impl Counters {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn summary(&self) -> String {
                let mut out = String::new();
                $(
                    out.push_str(&format!("{:<24} {}\n", $label, self.$field.load(Ordering::Relaxed)));
                )+
                out
            }
        }
    };
}

counters! {
    read_same_epoch => "ReadSameEpoch",
    read_exclusive => "ReadExclusive",
    read_share => "ReadShare",
    read_shared => "ReadShared",
    write_same_epoch => "WriteSameEpoch",
    write_exclusive => "WriteExclusive",
    write_shared => "WriteShared",
    write_read_race => "Write-ReadRace",
    read_write_race => "Read-WriteRace",
    write_write_race => "Write-WriteRace",
    read_shared_write_race => "Read(Shared)-WriteRace",
    acquire => "Acquire",
    release => "Release",
    fork => "Fork",
    join => "Join",
    barrier => "Barrier",
    wait => "Wait",
    volatile => "Volatile",
    other => "Other",
}

impl Counters {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reflects_bumps() {
        let c = Counters::new();
        Counters::bump(&c.read_exclusive);
        Counters::bump(&c.read_exclusive);
        Counters::bump(&c.write_write_race);
        let s = c.summary();
        assert!(s.contains("ReadExclusive"));
        assert_eq!(c.read_exclusive.load(Ordering::Relaxed), 2);
        assert_eq!(c.write_write_race.load(Ordering::Relaxed), 1);
    }
}
