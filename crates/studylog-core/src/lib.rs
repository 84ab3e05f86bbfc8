//! # Studylog Core Library
//!
//! This library provides the core business logic for Studylog, a personal
//! study-time tracker. All operations are available through the library API;
//! the CLI binary is a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Study Store**: the single authority over study-tracking state --
//!   goals, session history, streaks, motivation and the timer
//! - **Timer Engine**: a clock-driven countdown state machine that turns a
//!   completed countdown into a study session
//! - **Persistence Gateway**: async trait over the remote relational store,
//!   with a PostgREST-style HTTP implementation and a retry combinator
//! - **Storage**: local snapshot cache (SQLite key-value) and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`StudyStore`]: store operations and derived progress metrics
//! - [`TimerEngine`]: countdown state machine
//! - [`StudyBackend`]: persistence gateway trait
//! - [`SnapshotCache`]: durable local mirror of goals and streak state

pub mod clock;
pub mod error;
pub mod events;
pub mod gateway;
pub mod model;
pub mod storage;
pub mod store;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, CacheError, ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use gateway::{retry::with_retry, retry::RetryPolicy, RestBackend, StudyBackend};
pub use model::{
    Goals, ProgressSnapshot, SessionDraft, SessionId, SessionPatch, StreakState, StudySession,
    UserId,
};
pub use storage::{Config, SnapshotCache, StateSnapshot};
pub use store::StudyStore;
pub use timer::{TimerEngine, TimerState, INITIAL_DURATION_SECS};
