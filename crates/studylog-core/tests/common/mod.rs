//! Shared test support: an in-memory backend with controllable failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use studylog_core::{
    Goals, SessionId, SessionPatch, StorageError, StudyBackend, StudySession, UserId,
};

/// In-memory stand-in for the remote relational store.
#[derive(Default)]
pub struct MemoryBackend {
    user: Mutex<Option<UserId>>,
    goals: Mutex<HashMap<String, Goals>>,
    sessions: Mutex<Vec<StudySession>>,
    /// When set, every write fails with a storage error.
    pub fail_writes: AtomicBool,
    /// Number of default goals records created.
    pub goals_created: AtomicU32,
    /// When set, `insert_session` parks until released.
    gate: Mutex<Option<InsertGate>>,
    /// When set, `authenticated_user` parks until released.
    auth_gate: Mutex<Option<InsertGate>>,
}

#[derive(Clone)]
pub struct InsertGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl MemoryBackend {
    pub fn signed_in(user: &str) -> Self {
        let backend = Self::default();
        *backend.user.lock().unwrap() = Some(UserId(user.to_string()));
        backend
    }

    pub fn stored_sessions(&self) -> Vec<StudySession> {
        self.sessions.lock().unwrap().clone()
    }

    /// Park the next `insert_session` call. Returns `(entered, release)`:
    /// `entered` fires when the call reaches the gateway, `release` lets it
    /// proceed.
    pub fn gate_inserts(&self) -> (Arc<Notify>, Arc<Notify>) {
        Self::arm_gate(&self.gate)
    }

    /// Park the next `authenticated_user` call, same contract as
    /// [`Self::gate_inserts`].
    pub fn gate_auth(&self) -> (Arc<Notify>, Arc<Notify>) {
        Self::arm_gate(&self.auth_gate)
    }

    fn arm_gate(slot: &Mutex<Option<InsertGate>>) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *slot.lock().unwrap() = Some(InsertGate {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        (entered, release)
    }

    fn write_guard(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Request("injected write failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StudyBackend for MemoryBackend {
    async fn authenticated_user(&self) -> Result<Option<UserId>, StorageError> {
        let gate = self.auth_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(self.user.lock().unwrap().clone())
    }

    async fn fetch_goals_for(&self, user: &UserId) -> Result<Goals, StorageError> {
        let mut goals = self.goals.lock().unwrap();
        if let Some(existing) = goals.get(&user.0) {
            return Ok(existing.clone());
        }
        self.goals_created.fetch_add(1, Ordering::SeqCst);
        let defaults = Goals::default();
        goals.insert(user.0.clone(), defaults.clone());
        Ok(defaults)
    }

    async fn upsert_goals(&self, user: &UserId, goals: &Goals) -> Result<(), StorageError> {
        self.write_guard()?;
        self.goals
            .lock()
            .unwrap()
            .insert(user.0.clone(), goals.clone());
        Ok(())
    }

    async fn insert_session(&self, session: &StudySession) -> Result<StudySession, StorageError> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.write_guard()?;
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session.clone())
    }

    async fn fetch_sessions(&self, user: &UserId) -> Result<Vec<StudySession>, StorageError> {
        let mut sessions: Vec<StudySession> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == *user)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(sessions)
    }

    async fn delete_session(&self, id: SessionId, user: &UserId) -> Result<(), StorageError> {
        self.write_guard()?;
        self.sessions
            .lock()
            .unwrap()
            .retain(|s| !(s.id == id && s.user_id == *user));
        Ok(())
    }

    async fn update_session(
        &self,
        id: SessionId,
        user: &UserId,
        patch: &SessionPatch,
    ) -> Result<StudySession, StorageError> {
        self.write_guard()?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id && s.user_id == *user)
            .ok_or_else(|| StorageError::NotFound(format!("session {id}")))?;
        if let Some(duration) = patch.duration_min {
            session.duration_min = duration;
        }
        if let Some(note) = &patch.note {
            session.note = note.clone();
        }
        Ok(session.clone())
    }
}
