//! The typed input event stream.
//!
//! The instrumentation collaborator that emits these events is out of
//! scope for this crate; it only defines the wire shape of the events it
//! would hand to the engine, plus a newline-delimited-JSON trace reader
//! for offline replay (the CLI, `bins/racetrack-replay`, and the
//! integration tests use it). Dispatch on these events is a plain `match`
//! over the tag — no inheritance hierarchy.

use racetrack_clock::Tid;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead};
use std::path::Path;

/// Identity of a lock, volatile field, class, or barrier. Traces name these
/// with a plain string (a class name, a field's qualified name, ...); the
/// engine keys its sync-object maps on this identity.
pub type ObjectId = String;

/// Kind of memory access an `Access` event denotes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    Field,
    Array,
    Volatile,
    /// A static field on `class`. Carries class-init happens-before: the
    /// access additionally observes whatever the class's init clock has
    /// accumulated, folded in before the read/write rule runs.
    StaticField { class: ObjectId },
}

/// A source location attached to a report for human consumption. Purely
/// descriptive; the engine never branches on it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One entry in the typed event stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    NewThread { tid: Tid },
    Start { parent: Tid, child: Tid },
    Join { joiner: Tid, joinee: Tid },
    Stop { tid: Tid },

    Access {
        access_kind: AccessKind,
        is_write: bool,
        tid: Tid,
        /// Identity of the field or array element; for `Volatile`, the
        /// volatile variable's identity.
        target: ObjectId,
        location: SourceLocation,
    },

    Acquire { lock: ObjectId, tid: Tid },
    Release { lock: ObjectId, tid: Tid },

    PreWait { tid: Tid, monitor: ObjectId },
    PostWait { tid: Tid, monitor: ObjectId },
    PreNotify { tid: Tid, monitor: ObjectId },
    PostNotify { tid: Tid, monitor: ObjectId },

    BarrierEnter { barrier: ObjectId, tid: Tid },
    BarrierExit { barrier: ObjectId, tid: Tid },

    ClassInitialized { class: ObjectId, tid: Tid },
    ClassAccessed { class: ObjectId, tid: Tid },
}

/// A parsed newline-delimited-JSON trace file: one [`Event`] per line.
///
/// Grounded in the teacher's tagged wire `Event` (`lithos-events::Event`,
/// dispatched by discriminant over a binary mmap ring); a race-detector
/// trace is offline replay input rather than a live low-latency feed, so
/// this uses line-delimited JSON via `serde_json` instead of a shared
/// binary layout.
pub struct Trace {
    pub events: Vec<Event>,
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("failed to read trace file '{path}'")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse trace line {line_no}: {source}")]
    Parse {
        line_no: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl Trace {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path_ref = path.as_ref();
        let file = std::fs::File::open(path_ref).map_err(|source| TraceError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        let reader = io::BufReader::new(file);
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| TraceError::Read {
                path: path_ref.display().to_string(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(line)
                .map_err(|source| TraceError::Parse { line_no: idx + 1, source })?;
            events.push(event);
        }
        Ok(Trace { events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_round_trips_through_json() {
        let ev = Event::Access {
            access_kind: AccessKind::Field,
            is_write: true,
            tid: 3,
            target: "Foo.x".into(),
            location: SourceLocation { file: "Foo.java".into(), line: 42 },
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::Access { tid, target, .. } => {
                assert_eq!(tid, 3);
                assert_eq!(target, "Foo.x");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
