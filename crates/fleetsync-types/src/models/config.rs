//! Application-level configuration, persisted as JSON in the data dir.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Bearer token guarding the admin API. Empty denies every admin call.
    pub admin_token: String,
    /// Timeout applied by the scheduler to each leader round-trip
    pub pull_timeout_secs: u64,
    /// First backoff delay after a transient pull failure
    pub backoff_base_secs: u64,
    /// Backoff ceiling
    pub backoff_max_secs: u64,
    /// Online nodes unseen for this many sync intervals are marked offline (0 = never)
    pub stale_after_intervals: u32,
    /// How often the leader runs the staleness sweep
    pub stale_sweep_secs: u64,
}

impl AppConfig {
    /// Create default configuration.
    pub fn new() -> Self {
        Self {
            admin_token: String::new(),
            pull_timeout_secs: 30,
            backoff_base_secs: 5,
            backoff_max_secs: 300,
            stale_after_intervals: 3,
            stale_sweep_secs: 30,
        }
    }

    /// Per-request timeout for leader calls. Never zero, so a hand-edited
    /// `0` cannot make every request fail instantly.
    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_timeout_is_at_least_one_second() {
        let mut config = AppConfig::default();
        assert_eq!(config.pull_timeout(), Duration::from_secs(30));

        config.pull_timeout_secs = 0;
        assert_eq!(config.pull_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_timeout_from_file_is_clamped() {
        let config: AppConfig = serde_json::from_str(r#"{"pull_timeout_secs": 0}"#).unwrap();
        assert_eq!(config.pull_timeout_secs, 0);
        assert_eq!(config.pull_timeout(), Duration::from_secs(1));
        assert_eq!(config.backoff_base_secs, 5);
    }
}
