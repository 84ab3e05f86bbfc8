//! Persistence gateway to the remote relational store.
//!
//! The gateway is a stateless transport: every call is scoped by the owning
//! user id, returns typed data or a [`StorageError`], and performs no retry
//! of its own (see [`retry`] for the caller-side wrapper).

pub mod rest;
pub mod retry;
pub mod wire;

pub use rest::RestBackend;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::model::{Goals, SessionId, SessionPatch, StudySession, UserId};

/// Remote create/read/update/delete of goals and study sessions.
///
/// Implementations own no state beyond connection plumbing. Per-user
/// isolation is equality filtering here; the backing store's access policy
/// is the defense in depth.
#[async_trait]
pub trait StudyBackend: Send + Sync {
    /// Current authenticated user id, or `None` when signed out.
    async fn authenticated_user(&self) -> Result<Option<UserId>, StorageError>;

    /// Read the user's goals record, creating the default record if absent.
    ///
    /// Creation must be idempotent: the record is keyed uniquely per user,
    /// so a concurrent second call never produces a duplicate row.
    async fn fetch_goals_for(&self, user: &UserId) -> Result<Goals, StorageError>;

    /// Overwrite the user's goals record.
    async fn upsert_goals(&self, user: &UserId, goals: &Goals) -> Result<(), StorageError>;

    /// Insert a fully formed session. Returns the store-confirmed record.
    async fn insert_session(&self, session: &StudySession)
        -> Result<StudySession, StorageError>;

    /// All sessions for the user, ordered by session timestamp descending.
    async fn fetch_sessions(&self, user: &UserId) -> Result<Vec<StudySession>, StorageError>;

    /// Delete one session owned by the user.
    async fn delete_session(&self, id: SessionId, user: &UserId) -> Result<(), StorageError>;

    /// Patch duration and/or note, preserving identity and timestamp.
    /// Returns the store-confirmed record.
    async fn update_session(
        &self,
        id: SessionId,
        user: &UserId,
        patch: &SessionPatch,
    ) -> Result<StudySession, StorageError>;
}
