use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use raidlog_application::commands::store_commands;
use raidlog_application::AppState;

/// Prunes expired events and flushes the log every `housekeeping_interval_minutes`.
pub async fn schedule_housekeeping(state: AppState) {
    let period = Duration::from_secs(state.config.housekeeping_interval_minutes.max(1) * 60);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; startup already loaded a fresh log.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match store_commands::run_housekeeping(&state).await {
            Ok(pruned) => debug!(pruned, "housekeeping pass finished"),
            Err(err) => error!("housekeeping failed: {}", err),
        }
    }
}
