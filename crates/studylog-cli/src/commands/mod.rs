pub mod account;
pub mod goal;
pub mod session;
pub mod stats;
pub mod timer;

use std::sync::Arc;

use studylog_core::{Config, RestBackend, SnapshotCache, StudyStore, SystemClock, UserId};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Single-threaded runtime for the async store operations.
fn runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Build a store wired to the configured backend and the local cache.
fn build_store(config: &Config) -> Result<StudyStore, Box<dyn std::error::Error>> {
    let mut backend = RestBackend::new(&config.backend.base_url, &config.backend.api_key)?;
    if let Some(user_id) = &config.backend.user_id {
        backend = backend.with_user(UserId(user_id.clone()));
    }
    let store = StudyStore::new(Arc::new(backend), Arc::new(SystemClock))
        .with_timer_duration(config.timer.initial_duration_secs)
        .with_cache(SnapshotCache::open()?);
    Ok(store)
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
