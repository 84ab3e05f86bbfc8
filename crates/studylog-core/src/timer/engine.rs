//! Countdown timer state machine.
//!
//! The engine owns no thread and never reads the wall clock itself -- the
//! caller drives it by invoking `tick()` with an injected [`Clock`], once a
//! second in production or with virtual time in tests.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Armed -> Running -> Completing -> (NoteCapture | Armed)
//!                                 NoteCapture -> Armed
//! ```
//!
//! `Completing` is transitional: it is resolved in the same call that enters
//! it, so observers only ever see `NoteCapture` (>= 1 whole minute elapsed)
//! or `Armed` (sub-minute run, discarded with the subject retained).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::Event;
use crate::model::{normalize_note, SessionDraft};

/// Default countdown length: 25 minutes.
pub const INITIAL_DURATION_SECS: u32 = 25 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// No subject selected, not running.
    Idle,
    /// Subject selected, countdown at full or partial value, not running.
    Armed,
    /// Ticking; remaining decreasing, elapsed accruing.
    Running,
    /// Countdown hit zero or a manual stop landed; resolved immediately.
    Completing,
    /// Awaiting an optional note before the session is committed.
    NoteCapture,
}

impl TimerState {
    fn name(self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Armed => "armed",
            TimerState::Running => "running",
            TimerState::Completing => "completing",
            TimerState::NoteCapture => "awaiting a note",
        }
    }
}

/// Core countdown state machine.
///
/// Serializable so a CLI invocation can persist it between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    subject: Option<String>,
    initial_secs: u32,
    remaining_secs: u32,
    elapsed_secs: u32,
    /// When the current run was started.
    started_at: Option<DateTime<Utc>>,
    /// Instant of the last elapsed-time flush while running.
    last_tick_at: Option<DateTime<Utc>>,
    /// Whole minutes captured at Completing, pending the note.
    pending_duration_min: Option<u32>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::with_duration(INITIAL_DURATION_SECS)
    }

    /// Create an engine with a custom countdown length.
    pub fn with_duration(initial_secs: u32) -> Self {
        Self {
            state: TimerState::Idle,
            subject: None,
            initial_secs,
            remaining_secs: initial_secs,
            elapsed_secs: 0,
            started_at: None,
            last_tick_at: None,
            pending_duration_min: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Whole minutes waiting for a note, if any.
    pub fn pending_duration_min(&self) -> Option<u32> {
        self.pending_duration_min
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, clock: &dyn Clock) -> Event {
        Event::StateSnapshot {
            state: self.state,
            subject: self.subject.clone(),
            remaining_secs: self.remaining_secs,
            elapsed_secs: self.elapsed_secs,
            at: clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Select (or clear) the study subject. Arms the countdown.
    ///
    /// Rejected while running or awaiting a note so an in-flight session
    /// cannot change subject under the caller.
    pub fn select_subject(
        &mut self,
        subject: Option<String>,
        clock: &dyn Clock,
    ) -> Result<Event, ValidationError> {
        match self.state {
            TimerState::Idle | TimerState::Armed => {
                self.subject = subject.filter(|s| !s.trim().is_empty());
                self.state = if self.subject.is_some() {
                    TimerState::Armed
                } else {
                    TimerState::Idle
                };
                Ok(Event::SubjectSelected {
                    subject: self.subject.clone(),
                    at: clock.now(),
                })
            }
            state => Err(ValidationError::TimerState { state: state.name() }),
        }
    }

    /// Start the countdown. Fails without a subject; never double-starts.
    pub fn start(&mut self, clock: &dyn Clock) -> Result<Event, ValidationError> {
        match self.state {
            TimerState::Idle => Err(ValidationError::NoSubjectSelected),
            TimerState::Armed => {
                let subject = self
                    .subject
                    .clone()
                    .ok_or(ValidationError::NoSubjectSelected)?;
                let now = clock.now();
                self.state = TimerState::Running;
                self.started_at = Some(now);
                self.last_tick_at = Some(now);
                Ok(Event::TimerStarted {
                    subject,
                    remaining_secs: self.remaining_secs,
                    at: now,
                })
            }
            state => Err(ValidationError::TimerState { state: state.name() }),
        }
    }

    /// Stop a running countdown and resolve the captured time.
    pub fn stop(&mut self, clock: &dyn Clock) -> Result<Event, ValidationError> {
        if self.state != TimerState::Running {
            return Err(ValidationError::TimerState {
                state: self.state.name(),
            });
        }
        self.flush_elapsed(clock);
        self.state = TimerState::Completing;
        Ok(self.resolve_completion(false, clock))
    }

    /// Start/stop toggle. While running this always stops, never restarts.
    pub fn toggle(&mut self, clock: &dyn Clock) -> Result<Event, ValidationError> {
        if self.state == TimerState::Running {
            self.stop(clock)
        } else {
            self.start(clock)
        }
    }

    /// Flush elapsed time. Returns `Some` exactly once when the countdown
    /// reaches zero; further ticks are no-ops until the caller acts.
    pub fn tick(&mut self, clock: &dyn Clock) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(clock);
        if self.remaining_secs == 0 {
            self.state = TimerState::Completing;
            return Some(self.resolve_completion(true, clock));
        }
        None
    }

    /// The `isStudying` guard: flipping to running requires a subject,
    /// flipping off freezes the countdown in place.
    pub fn set_studying(&mut self, studying: bool, clock: &dyn Clock) -> Result<(), ValidationError> {
        if studying {
            if self.subject.is_none() {
                return Err(ValidationError::NoSubjectSelected);
            }
            if self.state != TimerState::Running {
                let now = clock.now();
                self.state = TimerState::Running;
                self.started_at.get_or_insert(now);
                self.last_tick_at = Some(now);
            }
        } else if self.state == TimerState::Running {
            self.flush_elapsed(clock);
            self.state = TimerState::Armed;
            self.last_tick_at = None;
        }
        Ok(())
    }

    /// Build the draft for the pending session without consuming it.
    ///
    /// Only valid in `NoteCapture`. The engine stays pending, so a failed
    /// persistence attempt can be retried; call [`Self::finish_commit`]
    /// once the draft is durably stored.
    pub fn pending_draft(
        &self,
        note: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<SessionDraft, ValidationError> {
        if self.state != TimerState::NoteCapture {
            return Err(ValidationError::TimerState {
                state: self.state.name(),
            });
        }
        let duration_min = self
            .pending_duration_min
            .ok_or(ValidationError::SessionTooShort)?;
        let subject = self
            .subject
            .clone()
            .ok_or(ValidationError::NoSubjectSelected)?;
        Ok(SessionDraft {
            subject,
            duration_min,
            note: normalize_note(note),
            recorded_at: clock.now(),
        })
    }

    /// Commit the pending session with an optional note.
    ///
    /// Only valid in `NoteCapture`. Resets the countdown and hands back a
    /// draft for the store to persist.
    pub fn commit(
        &mut self,
        note: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<SessionDraft, ValidationError> {
        let draft = self.pending_draft(note, clock)?;
        self.rearm();
        Ok(draft)
    }

    /// Rearm after the pending draft has been persisted. No-op outside
    /// `NoteCapture`.
    pub fn finish_commit(&mut self) {
        if self.state == TimerState::NoteCapture {
            self.rearm();
        }
    }

    /// Throw away the pending session instead of committing it.
    pub fn discard_pending(&mut self, clock: &dyn Clock) -> Option<Event> {
        if self.state != TimerState::NoteCapture {
            return None;
        }
        let elapsed = self.elapsed_secs;
        self.rearm();
        Some(Event::SessionDiscarded {
            elapsed_secs: elapsed,
            at: clock.now(),
        })
    }

    /// Stop and restore the full countdown. History and subject untouched.
    pub fn reset(&mut self, clock: &dyn Clock) -> Event {
        self.rearm();
        Event::TimerReset { at: clock.now() }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, clock: &dyn Clock) {
        if let Some(last) = self.last_tick_at {
            let now = clock.now();
            let delta = (now - last).num_seconds().max(0) as u64;
            // Never over-run the countdown, even if ticks arrive late.
            let step = (delta.min(u64::from(self.remaining_secs))) as u32;
            self.remaining_secs -= step;
            self.elapsed_secs = self.elapsed_secs.saturating_add(step);
            self.last_tick_at = Some(now);
        }
    }

    /// Resolve the transitional `Completing` state.
    ///
    /// Sub-minute runs are discarded with the subject retained; anything
    /// longer moves to `NoteCapture`. An auto-completion always emits
    /// `TimerCompleted` so the completion signal fires exactly once.
    fn resolve_completion(&mut self, auto: bool, clock: &dyn Clock) -> Event {
        let elapsed = self.elapsed_secs;
        let duration_min = elapsed / 60;
        let at = clock.now();
        self.last_tick_at = None;

        if duration_min < 1 {
            self.rearm();
            return Event::SessionDiscarded {
                elapsed_secs: elapsed,
                at,
            };
        }

        self.pending_duration_min = Some(duration_min);
        self.state = TimerState::NoteCapture;
        if auto {
            Event::TimerCompleted {
                subject: self.subject.clone().unwrap_or_default(),
                elapsed_secs: elapsed,
                duration_min,
                at,
            }
        } else {
            Event::TimerStopped {
                elapsed_secs: elapsed,
                duration_min,
                at,
            }
        }
    }

    fn rearm(&mut self) {
        self.state = if self.subject.is_some() {
            TimerState::Armed
        } else {
            TimerState::Idle
        };
        self.remaining_secs = self.initial_secs;
        self.elapsed_secs = 0;
        self.started_at = None;
        self.last_tick_at = None;
        self.pending_duration_min = None;
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}
