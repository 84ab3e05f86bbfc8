//! Core error types for studylog-core.
//!
//! The taxonomy follows the three failure classes of the store contract:
//! validation failures (synchronous, never retried), auth failures (no
//! authenticated user), and storage failures (gateway/network, retryable).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studylog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Bad input to a store operation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No authenticated user where one is required
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Gateway / remote store failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Local snapshot cache failures
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors. Always synchronous and never retried.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Negative minutes passed to a goal or time accumulator
    #[error("Minutes for '{field}' must be zero or greater (got {value})")]
    NegativeMinutes { field: &'static str, value: i64 },

    /// Daily todo out of bounds after trimming
    #[error("Daily todo must be between 1 and {max} characters (got {len})")]
    TodoLength { len: usize, max: usize },

    /// Timer started without a subject selection
    #[error("Select a subject before starting the timer")]
    NoSubjectSelected,

    /// Session shorter than the one-minute floor
    #[error("Session duration must be at least one minute")]
    SessionTooShort,

    /// Operation attempted in the wrong timer state
    #[error("Timer operation not allowed while {state}")]
    TimerState { state: &'static str },

    /// Invalid value with field context
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Auth errors. Surfaced upstream as a redirect-to-login signal.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No authenticated user
    #[error("No authenticated user")]
    NotAuthenticated,
}

/// Storage errors carrying the backing store's diagnostic.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Transport-level failure (connection, timeout)
    #[error("Request to backing store failed: {0}")]
    Request(String),

    /// The backing store rejected the operation
    #[error("Backing store rejected the operation ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response did not match the expected wire shape
    #[error("Unexpected response from backing store: {0}")]
    Decode(String),

    /// Row lookup came back empty
    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Local snapshot cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to open the cache database
    #[error("Failed to open cache at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Cache query failed: {0}")]
    QueryFailed(String),

    /// Snapshot could not be (de)serialized
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

// Helper implementations for converting from other error types

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StorageError::Decode(err.to_string())
        } else {
            StorageError::Request(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::QueryFailed(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
