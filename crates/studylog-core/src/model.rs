//! Canonical domain model.
//!
//! Wire-format naming (snake_case columns, optional `user_id`) stays at the
//! gateway boundary; everything inside the store speaks these types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default daily goal for a lazily created goals record, in minutes.
pub const DEFAULT_DAILY_GOAL_MIN: u32 = 120;
/// Default weekly goal for a lazily created goals record, in minutes.
pub const DEFAULT_WEEKLY_GOAL_MIN: u32 = 840;
/// Upper bound on the daily todo text, in characters.
pub const MAX_TODO_CHARS: usize = 1000;

/// Opaque identity of the owning user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A completed block of study time.
///
/// Immutable once stored, except for explicit edits of duration and note
/// which preserve the identity and the original `recorded_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: SessionId,
    pub user_id: UserId,
    pub subject: String,
    /// Whole minutes, always >= 1.
    pub duration_min: u32,
    /// Trimmed free text; empty input becomes absent.
    pub note: Option<String>,
    /// The moment the session was recorded, distinct from row creation time.
    pub recorded_at: DateTime<Utc>,
}

/// Input to `add_session` before an identity and owner are assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDraft {
    pub subject: String,
    pub duration_min: u32,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Partial update for an existing session. `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    pub duration_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
}

/// Per-user daily/weekly targets plus a free-text daily intention.
/// Exactly one record per user, created lazily with these defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    pub daily_goal_min: u32,
    pub weekly_goal_min: u32,
    pub daily_todo: String,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_goal_min: DEFAULT_DAILY_GOAL_MIN,
            weekly_goal_min: DEFAULT_WEEKLY_GOAL_MIN,
            daily_todo: String::new(),
        }
    }
}

/// Consecutive-day study streak. Recomputed, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub streak_days: u32,
    /// Running maximum; not required to equal the current streak.
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
}

/// Derived progress metrics. Never stored; recomputed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub today_minutes: u32,
    pub total_minutes: u32,
    /// today / daily goal, percent, capped at 100.
    pub daily_pct: f64,
    /// total / weekly goal, percent, capped at 100.
    pub weekly_pct: f64,
    pub streak_days: u32,
    pub longest_streak: u32,
    /// Bounded [0, 100].
    pub motivation: u8,
}

/// Trim a free-text note; empty input maps to absent.
pub fn normalize_note(note: Option<&str>) -> Option<String> {
    match note {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    }
}
