//! Replays a trace file through the engine and prints the aggregated
//! rule-outcome counters at exit: load config, install a
//! `tracing_subscriber::fmt` layer with an `EnvFilter`, then run.

use racetrack_config::EngineConfig;
use racetrack_engine::Engine;
use racetrack_events::{AccessKind, Event, SourceLocation, Trace};
use racetrack_report::CountingReporter;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let trace_path = args.next();

    let config = match &config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    info!(
        sampling_rate = config.sampling_rate,
        sampling_scheme = ?config.sampling_scheme,
        max_tid = config.max_tid,
        "RACETRACK: loaded configuration"
    );

    let events = match &trace_path {
        Some(path) => Trace::load(path)?.events,
        None => {
            info!("RACETRACK: no trace given, replaying the built-in demo (write-read race)");
            demo_trace()
        }
    };

    let engine = Engine::new(config, Arc::new(CountingReporter::new()));
    for event in events {
        engine.handle_event(event);
    }

    print!("{}", engine.counters.summary());
    Ok(())
}

/// A minimal two-thread write-read race, used when no trace file is given.
fn demo_trace() -> Vec<Event> {
    let location = SourceLocation { file: "Demo.java".into(), line: 1 };
    vec![
        Event::NewThread { tid: 0 },
        Event::NewThread { tid: 1 },
        Event::Access {
            access_kind: AccessKind::Field,
            is_write: true,
            tid: 0,
            target: "Demo.x".into(),
            location: location.clone(),
        },
        Event::Access {
            access_kind: AccessKind::Field,
            is_write: false,
            tid: 1,
            target: "Demo.x".into(),
            location,
        },
    ]
}
