//! Wire-format rows for the remote relational store.
//!
//! The remote tables use snake_case column naming and looser typing than the
//! domain model (nullable todo, signed integers). Field naming stays on this
//! side of the boundary; the store only ever sees [`crate::model`] types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::model::{Goals, SessionId, StudySession, UserId};

/// One row of the `goals` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsRow {
    pub user_id: String,
    pub daily_goal: i64,
    pub weekly_goal: i64,
    pub daily_todo: Option<String>,
}

impl GoalsRow {
    pub fn from_goals(user: &UserId, goals: &Goals) -> Self {
        Self {
            user_id: user.0.clone(),
            daily_goal: i64::from(goals.daily_goal_min),
            weekly_goal: i64::from(goals.weekly_goal_min),
            daily_todo: if goals.daily_todo.is_empty() {
                None
            } else {
                Some(goals.daily_todo.clone())
            },
        }
    }

    pub fn into_goals(self) -> Result<Goals, StorageError> {
        Ok(Goals {
            daily_goal_min: non_negative(self.daily_goal, "daily_goal")?,
            weekly_goal_min: non_negative(self.weekly_goal, "weekly_goal")?,
            daily_todo: self.daily_todo.unwrap_or_default(),
        })
    }
}

/// One row of the `study_sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: String,
    pub subject: String,
    /// Whole minutes.
    pub duration: i64,
    pub note: Option<String>,
    /// Session timestamp, distinct from row creation time.
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    pub fn from_session(session: &StudySession) -> Self {
        Self {
            id: session.id.0,
            user_id: session.user_id.0.clone(),
            subject: session.subject.clone(),
            duration: i64::from(session.duration_min),
            note: session.note.clone(),
            date: session.recorded_at,
            created_at: Some(session.recorded_at),
        }
    }

    pub fn into_session(self) -> Result<StudySession, StorageError> {
        let duration_min = non_negative(self.duration, "duration")?;
        if duration_min < 1 {
            return Err(StorageError::Decode(format!(
                "session {} has zero duration",
                self.id
            )));
        }
        Ok(StudySession {
            id: SessionId(self.id),
            user_id: UserId(self.user_id),
            subject: self.subject,
            duration_min,
            note: self.note.filter(|n| !n.is_empty()),
            recorded_at: self.date,
        })
    }
}

fn non_negative(value: i64, column: &str) -> Result<u32, StorageError> {
    u32::try_from(value)
        .map_err(|_| StorageError::Decode(format!("column '{column}' out of range: {value}")))
}
