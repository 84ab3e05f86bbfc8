use clap::Subcommand;
use studylog_core::{Config, SnapshotCache};

use super::{build_store, CliResult};

#[derive(Subcommand)]
pub enum AccountAction {
    /// Record the user id all remote operations act on behalf of
    Login { user_id: String },
    /// Forget the user and wipe every locally cached value
    Logout,
    /// Print the configured user id, if any
    Whoami,
}

pub fn run(action: AccountAction) -> CliResult {
    let mut config = Config::load()?;

    match action {
        AccountAction::Login { user_id } => {
            config.backend.user_id = Some(user_id.clone());
            config.save()?;
            println!("{{\"user_id\": \"{user_id}\"}}");
        }
        AccountAction::Logout => {
            let store = build_store(&config)?;
            store.logout();
            let kv = SnapshotCache::open()?;
            kv.kv_delete("timer_engine")?;
            config.backend.user_id = None;
            config.save()?;
            println!("{{\"logged_out\": true}}");
        }
        AccountAction::Whoami => match &config.backend.user_id {
            Some(user_id) => println!("{{\"user_id\": \"{user_id}\"}}"),
            None => println!("{{\"user_id\": null}}"),
        },
    }
    Ok(())
}
