use clap::Subcommand;
use studylog_core::{with_retry, Config};

use super::{build_store, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Show today/total minutes against the goals, plus streak and motivation
    Progress,
    /// Show the current and longest streak
    Streak,
}

pub fn run(action: StatsAction) -> CliResult {
    let config = Config::load()?;
    let store = build_store(&config)?;
    let policy = config.retry.policy();
    let rt = runtime()?;

    match action {
        StatsAction::Progress => {
            // Reconcile with the remote history so the derived counters are honest.
            rt.block_on(with_retry(policy, || store.fetch_goals()))?;
            rt.block_on(with_retry(policy, || store.load_sessions()))?;
            print_json(&store.progress())?;
        }
        StatsAction::Streak => {
            rt.block_on(with_retry(policy, || store.load_sessions()))?;
            print_json(&store.streak())?;
        }
    }
    Ok(())
}
