use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every observable state change in the timer and store produces an Event.
/// The CLI prints them; a GUI would subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SubjectSelected {
        subject: Option<String>,
        at: DateTime<Utc>,
    },
    TimerStarted {
        subject: String,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Manual stop with at least one whole minute on the clock.
    /// The engine is now awaiting an optional note.
    TimerStopped {
        elapsed_secs: u32,
        duration_min: u32,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Doubles as the completion signal; emitted
    /// exactly once per countdown.
    TimerCompleted {
        subject: String,
        elapsed_secs: u32,
        duration_min: u32,
        at: DateTime<Utc>,
    },
    /// Stopped before a whole minute elapsed; nothing is persisted.
    SessionDiscarded {
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        subject: Option<String>,
        remaining_secs: u32,
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
}
