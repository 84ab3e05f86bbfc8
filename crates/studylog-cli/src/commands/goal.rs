use clap::Subcommand;
use studylog_core::{with_retry, Config};

use super::{build_store, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Fetch goals from the remote store (creates defaults on first access)
    Show,
    /// Set the daily goal in minutes
    SetDaily { minutes: i64 },
    /// Set the weekly goal in minutes
    SetWeekly { minutes: i64 },
    /// Set the daily todo text
    Todo { text: String },
}

pub fn run(action: GoalAction) -> CliResult {
    let config = Config::load()?;
    let store = build_store(&config)?;
    let policy = config.retry.policy();
    let rt = runtime()?;

    match action {
        GoalAction::Show => {
            let goals = rt.block_on(with_retry(policy, || store.fetch_goals()))?;
            print_json(&goals)?;
        }
        GoalAction::SetDaily { minutes } => {
            store.set_daily_goal(minutes)?;
            rt.block_on(with_retry(policy, || store.save_goals()))?;
            print_json(&store.goals())?;
        }
        GoalAction::SetWeekly { minutes } => {
            store.set_weekly_goal(minutes)?;
            rt.block_on(with_retry(policy, || store.save_goals()))?;
            print_json(&store.goals())?;
        }
        GoalAction::Todo { text } => {
            store.set_daily_todo(&text)?;
            rt.block_on(with_retry(policy, || store.save_goals()))?;
            print_json(&store.goals())?;
        }
    }
    Ok(())
}
