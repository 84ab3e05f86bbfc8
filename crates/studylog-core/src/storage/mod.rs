mod cache;
mod config;

pub use cache::{SnapshotCache, StateSnapshot};
pub use config::{BackendConfig, Config, RetryConfig, TimerConfig};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/studylog[-dev]/` based on STUDYLOG_ENV.
///
/// Set STUDYLOG_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYLOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studylog-dev")
    } else {
        base_dir.join("studylog")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
