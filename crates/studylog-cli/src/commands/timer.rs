use clap::Subcommand;
use studylog_core::{with_retry, Config, Event, SnapshotCache, TimerEngine};

use super::{build_store, print_json, runtime, CliResult};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Select the study subject (arms the countdown)
    Select {
        /// Subject tag, e.g. "language" or "math"
        subject: String,
    },
    /// Clear the subject selection
    Clear,
    /// Start the countdown
    Start,
    /// Stop the countdown; sub-minute runs are discarded
    Stop {
        /// Commit immediately with this note instead of awaiting one
        #[arg(long)]
        note: Option<String>,
    },
    /// Commit the pending session with an optional note
    Commit {
        #[arg(long)]
        note: Option<String>,
    },
    /// Discard the pending session instead of committing it
    Discard,
    /// Tick the countdown and print the current state as JSON
    Status,
    /// Stop and restore the full countdown
    Reset,
}

fn load_engine(kv: &SnapshotCache) -> TimerEngine {
    if let Ok(Some(json)) = kv.kv_get(ENGINE_KEY) {
        if let Ok(engine) = serde_json::from_str::<TimerEngine>(&json) {
            return engine;
        }
    }
    TimerEngine::new()
}

fn save_engine(kv: &SnapshotCache, engine: &TimerEngine) -> CliResult {
    let json = serde_json::to_string(engine)?;
    kv.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

/// Audible completion signal; failure to ring must never block the flow.
fn ring_bell() {
    eprint!("\x07");
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load()?;
    let store = build_store(&config)?;
    let policy = config.retry.policy();
    let kv = SnapshotCache::open()?;
    store.restore_timer(load_engine(&kv));

    match action {
        TimerAction::Select { subject } => {
            let event = store.select_subject(Some(subject))?;
            print_json(&event)?;
        }
        TimerAction::Clear => {
            let event = store.select_subject(None)?;
            print_json(&event)?;
        }
        TimerAction::Start => {
            let event = store.start_timer()?;
            print_json(&event)?;
        }
        TimerAction::Stop { note } => {
            let event = store.stop_timer()?;
            print_json(&event)?;
            if matches!(event, Event::TimerStopped { .. }) {
                if let Some(note) = note {
                    let session = runtime()?
                        .block_on(with_retry(policy, || store.commit_session(Some(&note))))?;
                    print_json(&session)?;
                }
            }
        }
        TimerAction::Commit { note } => {
            let session = runtime()?
                .block_on(with_retry(policy, || store.commit_session(note.as_deref())))?;
            print_json(&session)?;
        }
        TimerAction::Discard => {
            if let Some(event) = store.discard_pending() {
                print_json(&event)?;
            } else {
                println!("{{\"type\": \"nothing_pending\"}}");
            }
        }
        TimerAction::Status => {
            let completed = store.tick();
            print_json(&store.timer_snapshot())?;
            if let Some(event) = completed {
                if matches!(event, Event::TimerCompleted { .. }) {
                    ring_bell();
                }
                print_json(&event)?;
            }
        }
        TimerAction::Reset => {
            let event = store.reset_timer();
            print_json(&event)?;
        }
    }

    save_engine(&kv, &store.timer_engine())?;
    Ok(())
}
