use chrono::Utc;
use clap::Subcommand;
use studylog_core::{with_retry, Config, SessionDraft, SessionId, SessionPatch};
use uuid::Uuid;

use super::{build_store, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Fetch the full session history, newest first
    List,
    /// Record a session by hand, outside the timer
    Log {
        subject: String,
        /// Duration in whole minutes, at least 1
        minutes: u32,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a session by id
    Delete { id: Uuid },
    /// Change the duration or note of an existing session
    Edit {
        id: Uuid,
        #[arg(long)]
        minutes: Option<u32>,
        /// New note text; an empty string clears the note
        #[arg(long)]
        note: Option<String>,
    },
}

pub fn run(action: SessionAction) -> CliResult {
    let config = Config::load()?;
    let store = build_store(&config)?;
    let policy = config.retry.policy();
    let rt = runtime()?;

    match action {
        SessionAction::List => {
            let sessions = rt.block_on(with_retry(policy, || store.load_sessions()))?;
            print_json(&sessions)?;
        }
        SessionAction::Log { subject, minutes, note } => {
            let draft = SessionDraft {
                subject,
                duration_min: minutes,
                note,
                recorded_at: Utc::now(),
            };
            let session = rt.block_on(store.add_session(draft))?;
            store.update_today_time(i64::from(minutes))?;
            store.update_total_time(i64::from(minutes))?;
            print_json(&session)?;
        }
        SessionAction::Delete { id } => {
            rt.block_on(with_retry(policy, || store.delete_session(SessionId(id))))?;
            println!("{{\"deleted\": \"{id}\"}}");
        }
        SessionAction::Edit { id, minutes, note } => {
            let patch = SessionPatch {
                duration_min: minutes,
                note: note.map(|n| if n.trim().is_empty() { None } else { Some(n) }),
            };
            let session = rt.block_on(store.edit_session(SessionId(id), patch))?;
            print_json(&session)?;
        }
    }
    Ok(())
}
