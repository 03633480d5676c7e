use std::time::Duration;

use chrono::Utc;
use fleetsync_types::NodeRole;
use tokio::time::{interval, MissedTickBehavior};

use crate::state::AppState;

pub fn start_stale_sweep(state: AppState) {
    let multiplier = state.config().stale_after_intervals;
    if multiplier == 0 {
        tracing::info!("Stale-node sweep disabled (stale_after_intervals = 0)");
        return;
    }
    let period = Duration::from_secs(state.config().stale_sweep_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            sweep_once(&state, multiplier).await;
        }
    });
    tracing::info!("✅ Stale-node sweep started (every {}s, {}× interval)", period.as_secs(), multiplier);
}

async fn sweep_once(state: &AppState, multiplier: u32) {
    match state.roles().current().await {
        Ok(role) if role.role == NodeRole::Leader => {},
        Ok(_) => return,
        Err(e) => {
            tracing::warn!("⚠️ Failed to read role config: {}", e);
            return;
        },
    }

    if let Err(e) = state.registry().sweep_stale(Utc::now(), multiplier).await {
        tracing::warn!("⚠️ Stale-node sweep failed: {}", e);
    }
}
