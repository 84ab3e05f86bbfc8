//! The study store: single authority over all study-tracking state.
//!
//! Every mutation goes through an explicit [`StudyStore`] instance holding
//! an injected backend, clock and optional local cache -- no ambient
//! singleton. Durable operations are write-through: the remote store
//! confirms first, then local state mutates. On gateway failure nothing
//! local changes, so history never holds a phantom entry.
//!
//! A generation counter guards against stale responses: a gateway result
//! that lands after `reset`/`logout` is logged and dropped instead of being
//! applied to the fresh state.

mod streak;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;
use crate::error::{AuthError, CoreError, Result, ValidationError};
use crate::events::Event;
use crate::gateway::StudyBackend;
use crate::model::{
    normalize_note, Goals, ProgressSnapshot, SessionDraft, SessionId, SessionPatch, StreakState,
    StudySession, UserId, MAX_TODO_CHARS,
};
use crate::storage::{SnapshotCache, StateSnapshot};
use crate::timer::{TimerEngine, TimerState};

struct StoreState {
    goals: Goals,
    today_minutes: u32,
    total_minutes: u32,
    streak: StreakState,
    motivation: u8,
    sessions: Vec<StudySession>,
    current_user: Option<UserId>,
    timer: TimerEngine,
    /// Bumped on reset/logout; in-flight gateway results from an older
    /// generation are discarded.
    generation: u64,
}

impl StoreState {
    fn fresh(timer_secs: u32, generation: u64) -> Self {
        Self {
            goals: Goals::default(),
            today_minutes: 0,
            total_minutes: 0,
            streak: StreakState::default(),
            motivation: 100,
            sessions: Vec::new(),
            current_user: None,
            timer: TimerEngine::with_duration(timer_secs),
            generation,
        }
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            goals: self.goals.clone(),
            streak: self.streak,
            motivation: self.motivation,
        }
    }

    /// Re-derive both accumulators from the session list. Used after any
    /// reconciliation with the remote store so hand-updated counters cannot
    /// drift or double count.
    fn recompute_times(&mut self, clock: &dyn Clock) {
        let today = clock.today();
        self.total_minutes = self.sessions.iter().map(|s| s.duration_min).sum();
        self.today_minutes = self
            .sessions
            .iter()
            .filter(|s| clock.day_of(s.recorded_at) == today)
            .map(|s| s.duration_min)
            .sum();
    }

    /// Descending by session timestamp; equal timestamps keep insertion
    /// order, newest insert first.
    fn sort_sessions(&mut self) {
        self.sessions
            .sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    }
}

/// Process-local state container for goals, sessions, streaks and the timer.
pub struct StudyStore {
    backend: Arc<dyn StudyBackend>,
    clock: Arc<dyn Clock>,
    cache: Option<Mutex<SnapshotCache>>,
    timer_secs: u32,
    state: Mutex<StoreState>,
}

impl StudyStore {
    pub fn new(backend: Arc<dyn StudyBackend>, clock: Arc<dyn Clock>) -> Self {
        let timer_secs = crate::timer::INITIAL_DURATION_SECS;
        Self {
            backend,
            clock,
            cache: None,
            timer_secs,
            state: Mutex::new(StoreState::fresh(timer_secs, 0)),
        }
    }

    /// Use a custom countdown length for the embedded timer.
    pub fn with_timer_duration(mut self, secs: u32) -> Self {
        self.timer_secs = secs;
        self.state = Mutex::new(StoreState::fresh(secs, 0));
        self
    }

    /// Attach a durable snapshot cache and seed state from it if present.
    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        match cache.load() {
            Ok(Some(snapshot)) => {
                let mut state = self.state.lock().unwrap();
                state.goals = snapshot.goals;
                state.streak = snapshot.streak;
                state.motivation = snapshot.motivation;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "snapshot cache unreadable, starting fresh");
            }
        }
        self.cache = Some(Mutex::new(cache));
        self
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    /// Best-effort write-back of the cached subset. Failures are logged,
    /// never propagated -- the remote store stays authoritative.
    fn persist_snapshot(&self, state: &StoreState) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.lock().unwrap().save(&state.snapshot()) {
                tracing::warn!(error = %err, "failed to write snapshot cache");
            }
        }
    }

    // ── Goals and counters (local-only; caller decides persistence) ──

    pub fn set_daily_goal(&self, minutes: i64) -> Result<()> {
        let value = non_negative("daily_goal", minutes)?;
        let mut state = self.state();
        state.goals.daily_goal_min = value;
        self.persist_snapshot(&state);
        Ok(())
    }

    pub fn set_weekly_goal(&self, minutes: i64) -> Result<()> {
        let value = non_negative("weekly_goal", minutes)?;
        let mut state = self.state();
        state.goals.weekly_goal_min = value;
        self.persist_snapshot(&state);
        Ok(())
    }

    pub fn set_daily_todo(&self, todo: &str) -> Result<()> {
        let trimmed = todo.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > MAX_TODO_CHARS {
            return Err(ValidationError::TodoLength {
                len,
                max: MAX_TODO_CHARS,
            }
            .into());
        }
        let mut state = self.state();
        state.goals.daily_todo = trimmed.to_string();
        self.persist_snapshot(&state);
        Ok(())
    }

    /// Add to the rolling total study time. One call per completed session.
    pub fn update_total_time(&self, minutes: i64) -> Result<()> {
        let value = non_negative("total_time", minutes)?;
        self.state().total_minutes += value;
        Ok(())
    }

    /// Add to today's study time. One call per completed session.
    pub fn update_today_time(&self, minutes: i64) -> Result<()> {
        let value = non_negative("today_time", minutes)?;
        self.state().today_minutes += value;
        Ok(())
    }

    /// Zero the today-counter. Intended to run once per calendar-day boundary.
    pub fn reset_today_time(&self) {
        self.state().today_minutes = 0;
    }

    /// Apply a motivation delta, clamped to [0, 100]. Returns the new score.
    pub fn update_motivation(&self, delta: i32) -> u8 {
        let mut state = self.state();
        let next = (i32::from(state.motivation) + delta).clamp(0, 100) as u8;
        state.motivation = next;
        self.persist_snapshot(&state);
        next
    }

    /// Advance the consecutive-day streak for a session recorded today.
    /// Idempotent within the same calendar day.
    pub fn check_and_update_streak(&self) -> StreakState {
        let today = self.clock.today();
        let mut state = self.state();
        let next = streak::advance(state.streak, today);
        if next != state.streak {
            state.streak = next;
            self.persist_snapshot(&state);
            tracing::info!(
                streak_days = next.streak_days,
                longest = next.longest_streak,
                "streak updated"
            );
        }
        next
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn goals(&self) -> Goals {
        self.state().goals.clone()
    }

    pub fn streak(&self) -> StreakState {
        self.state().streak
    }

    pub fn motivation(&self) -> u8 {
        self.state().motivation
    }

    pub fn today_minutes(&self) -> u32 {
        self.state().today_minutes
    }

    pub fn total_minutes(&self) -> u32 {
        self.state().total_minutes
    }

    pub fn sessions(&self) -> Vec<StudySession> {
        self.state().sessions.clone()
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.state().current_user.clone()
    }

    /// Derived metrics, recomputed on every read.
    pub fn progress(&self) -> ProgressSnapshot {
        let state = self.state();
        ProgressSnapshot {
            today_minutes: state.today_minutes,
            total_minutes: state.total_minutes,
            daily_pct: pct(state.today_minutes, state.goals.daily_goal_min),
            weekly_pct: pct(state.total_minutes, state.goals.weekly_goal_min),
            streak_days: state.streak.streak_days,
            longest_streak: state.streak.longest_streak,
            motivation: state.motivation,
        }
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn select_subject(&self, subject: Option<String>) -> Result<Event> {
        let mut state = self.state();
        let event = state.timer.select_subject(subject, self.clock.as_ref())?;
        Ok(event)
    }

    pub fn start_timer(&self) -> Result<Event> {
        let mut state = self.state();
        Ok(state.timer.start(self.clock.as_ref())?)
    }

    pub fn stop_timer(&self) -> Result<Event> {
        let mut state = self.state();
        Ok(state.timer.stop(self.clock.as_ref())?)
    }

    /// Start/stop toggle; while running this always stops.
    pub fn toggle_timer(&self) -> Result<Event> {
        let mut state = self.state();
        Ok(state.timer.toggle(self.clock.as_ref())?)
    }

    /// Drive the countdown. Returns the completion event exactly once.
    pub fn tick(&self) -> Option<Event> {
        let mut state = self.state();
        state.timer.tick(self.clock.as_ref())
    }

    /// The `isStudying` guard: true requires a selected subject.
    pub fn set_studying(&self, studying: bool) -> Result<()> {
        let mut state = self.state();
        state.timer.set_studying(studying, self.clock.as_ref())?;
        Ok(())
    }

    pub fn reset_timer(&self) -> Event {
        let mut state = self.state();
        state.timer.reset(self.clock.as_ref())
    }

    /// Drop a pending session instead of committing it.
    pub fn discard_pending(&self) -> Option<Event> {
        let mut state = self.state();
        state.timer.discard_pending(self.clock.as_ref())
    }

    pub fn timer_state(&self) -> TimerState {
        self.state().timer.state()
    }

    pub fn current_subject(&self) -> Option<String> {
        self.state().timer.subject().map(str::to_string)
    }

    pub fn timer_snapshot(&self) -> Event {
        self.state().timer.snapshot(self.clock.as_ref())
    }

    /// Clone out the engine so a short-lived process can persist it.
    pub fn timer_engine(&self) -> TimerEngine {
        self.state().timer.clone()
    }

    /// Restore an engine persisted by a previous process.
    pub fn restore_timer(&self, engine: TimerEngine) {
        self.state().timer = engine;
    }

    // ── Durable operations (write-through) ───────────────────────────

    /// Resolve the authenticated user, caching the id for later calls.
    pub async fn require_user(&self) -> Result<UserId> {
        if let Some(user) = self.state().current_user.clone() {
            return Ok(user);
        }
        let generation = self.state().generation;
        let user = self
            .backend
            .authenticated_user()
            .await?
            .ok_or(AuthError::NotAuthenticated)?;
        let mut state = self.state();
        if state.generation == generation {
            state.current_user = Some(user.clone());
        }
        Ok(user)
    }

    /// Read goals from the gateway, creating the default record on first
    /// access. Local state is only touched on success.
    pub async fn fetch_goals(&self) -> Result<Goals> {
        let user = self.require_user().await?;
        let generation = self.state().generation;

        let goals = self.backend.fetch_goals_for(&user).await?;

        let mut state = self.state();
        if state.generation != generation {
            tracing::warn!("discarding goals fetched before reset");
            return Ok(goals);
        }
        state.goals = goals.clone();
        self.persist_snapshot(&state);
        Ok(goals)
    }

    /// Push the current goals record to the gateway.
    pub async fn save_goals(&self) -> Result<()> {
        let user = self.require_user().await?;
        let goals = self.state().goals.clone();
        self.backend.upsert_goals(&user, &goals).await?;
        Ok(())
    }

    /// Persist a session remotely, then prepend the confirmed record to
    /// local history and advance the streak. A failed remote write leaves
    /// local history untouched.
    pub async fn add_session(&self, draft: SessionDraft) -> Result<StudySession> {
        if draft.duration_min < 1 {
            return Err(ValidationError::SessionTooShort.into());
        }
        let user = self.require_user().await?;
        let generation = self.state().generation;

        let session = StudySession {
            id: SessionId::new(),
            user_id: user,
            subject: draft.subject,
            duration_min: draft.duration_min,
            note: normalize_note(draft.note.as_deref()),
            recorded_at: draft.recorded_at,
        };
        let confirmed = self.backend.insert_session(&session).await?;

        let mut state = self.state();
        if state.generation != generation {
            tracing::warn!(id = %confirmed.id, "discarding session inserted before reset");
            return Ok(confirmed);
        }
        state.sessions.insert(0, confirmed.clone());
        state.sort_sessions();
        state.streak = streak::advance(state.streak, self.clock.today());
        self.persist_snapshot(&state);
        Ok(confirmed)
    }

    /// Commit the timer's pending session: persist it, then rearm the
    /// engine and account for the time exactly once. On a gateway failure
    /// the engine stays in note capture, so the commit can be retried.
    pub async fn commit_session(&self, note: Option<&str>) -> Result<StudySession> {
        let (draft, generation) = {
            let state = self.state();
            (
                state.timer.pending_draft(note, self.clock.as_ref())?,
                state.generation,
            )
        };
        let duration = draft.duration_min;

        let session = self.add_session(draft).await?;

        let mut state = self.state();
        if state.generation == generation {
            state.timer.finish_commit();
            state.today_minutes += duration;
            state.total_minutes += duration;
        }
        Ok(session)
    }

    /// Replace local history with the gateway's view and re-derive the
    /// time counters from it.
    pub async fn load_sessions(&self) -> Result<Vec<StudySession>> {
        let user = self.require_user().await?;
        let generation = self.state().generation;

        let sessions = self.backend.fetch_sessions(&user).await?;

        let mut state = self.state();
        if state.generation != generation {
            tracing::warn!("discarding sessions fetched before reset");
            return Ok(sessions);
        }
        state.sessions = sessions.clone();
        state.sort_sessions();
        state.recompute_times(self.clock.as_ref());
        Ok(sessions)
    }

    /// Delete a session remotely, then drop it from local history.
    pub async fn delete_session(&self, id: SessionId) -> Result<()> {
        let user = self.require_user().await?;
        let generation = self.state().generation;

        self.backend.delete_session(id, &user).await?;

        let mut state = self.state();
        if state.generation != generation {
            return Ok(());
        }
        state.sessions.retain(|s| s.id != id);
        state.recompute_times(self.clock.as_ref());
        Ok(())
    }

    /// Edit duration and/or note of a stored session, preserving identity
    /// and the original timestamp.
    pub async fn edit_session(&self, id: SessionId, mut patch: SessionPatch) -> Result<StudySession> {
        if let Some(duration) = patch.duration_min {
            if duration < 1 {
                return Err(ValidationError::SessionTooShort.into());
            }
        }
        if let Some(note) = patch.note.take() {
            patch.note = Some(note.and_then(|n| normalize_note(Some(&n))));
        }
        let user = self.require_user().await?;
        let generation = self.state().generation;

        let confirmed = self.backend.update_session(id, &user, &patch).await?;

        let mut state = self.state();
        if state.generation != generation {
            return Ok(confirmed);
        }
        if let Some(slot) = state.sessions.iter_mut().find(|s| s.id == id) {
            *slot = confirmed.clone();
        }
        state.sort_sessions();
        state.recompute_times(self.clock.as_ref());
        Ok(confirmed)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Restore the store to its initial default state and clear the
    /// durable cache. In-flight gateway results are discarded afterwards.
    pub fn logout(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = StoreState::fresh(self.timer_secs, generation);
        drop(state);
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.lock().unwrap().clear() {
                tracing::warn!(error = %err, "failed to clear snapshot cache");
            }
        }
    }

    /// Alias for [`Self::logout`]; kept for callers that reset without a
    /// sign-out.
    pub fn reset(&self) {
        self.logout();
    }
}

fn non_negative(field: &'static str, minutes: i64) -> Result<u32, CoreError> {
    if minutes < 0 {
        return Err(ValidationError::NegativeMinutes {
            field,
            value: minutes,
        }
        .into());
    }
    u32::try_from(minutes).map_err(|_| {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("out of range: {minutes}"),
        }
        .into()
    })
}

fn pct(value: u32, goal: u32) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    (f64::from(value) / f64::from(goal) * 100.0).min(100.0)
}
