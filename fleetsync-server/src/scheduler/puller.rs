use std::time::Duration;

use fleetsync_types::{MIN_SYNC_INTERVAL_SECS, NodeRole};

use super::Backoff;
use crate::state::AppState;

/// Poll interval while not a connected follower.
const IDLE_POLL_SECS: u64 = 10;

pub fn start_follower_puller(state: AppState) {
    let config = state.config().clone();
    let mut backoff = Backoff::new(
        Duration::from_secs(config.backoff_base_secs),
        Duration::from_secs(config.backoff_max_secs),
    );

    tokio::spawn(async move {
        loop {
            let delay = run_cycle(&state, &mut backoff).await;
            tokio::time::sleep(delay).await;
        }
    });
    tracing::info!("✅ Follower puller started");
}

/// One scheduler cycle; returns how long to sleep before the next.
async fn run_cycle(state: &AppState, backoff: &mut Backoff) -> Duration {
    let role = match state.roles().current().await {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!("⚠️ Failed to read role config: {}", e);
            return Duration::from_secs(IDLE_POLL_SECS);
        },
    };

    if role.role != NodeRole::Follower || !role.should_pull() {
        backoff.reset();
        return Duration::from_secs(IDLE_POLL_SECS);
    }

    let interval = Duration::from_secs(u64::from(role.sync_interval_secs.max(MIN_SYNC_INTERVAL_SECS)));

    match state.engine().pull(state.leader_client()).await {
        Ok(Some(outcome)) => {
            if backoff.is_backing_off() {
                tracing::info!("Leader reachable again, resuming normal schedule");
            }
            backoff.reset();
            if !outcome.imported {
                tracing::debug!("Pull complete, no changes ({})", outcome.hash);
            }
            interval
        },
        Ok(None) => {
            tracing::debug!("Previous import still running, tick skipped");
            interval
        },
        Err(e) if e.is_transient() => {
            let delay = backoff.next_delay();
            tracing::warn!("⚠️ Pull failed, retrying in {}s: {}", delay.as_secs(), e);
            delay
        },
        Err(e) => {
            tracing::warn!("⚠️ Pull failed: {}", e);
            interval
        },
    }
}
