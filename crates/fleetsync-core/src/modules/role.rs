//! Leader / follower role state machine.
//!
//! Every transition is a read-modify-write of the single role record,
//! committed with a version compare-and-swap. A lost race surfaces as
//! `RoleError::ConcurrentModification` and nothing is written.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use fleetsync_types::{
    ConnectionTestResult, NodeRole, RoleConfig, RoleError, ValidationError,
    DEFAULT_SYNC_INTERVAL_SECS, MIN_SYNC_INTERVAL_SECS,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::modules::leader_client::LeaderClient;
use crate::modules::repository::RoleRepository;

/// Parameters for attaching a follower to a leader.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    #[serde(default)]
    pub sync_interval_secs: Option<u32>,
}

impl ConnectRequest {
    fn validate(&self) -> Result<u32, ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::new("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ValidationError::new("port", "must be between 1 and 65535"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::new("apiKey", "must not be empty"));
        }
        let interval = self.sync_interval_secs.unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);
        if interval < MIN_SYNC_INTERVAL_SECS {
            return Err(ValidationError::new(
                "syncIntervalSecs",
                format!("must be at least {MIN_SYNC_INTERVAL_SECS} seconds"),
            ));
        }
        Ok(interval)
    }
}

#[derive(Clone)]
pub struct RoleManager {
    roles: Arc<dyn RoleRepository>,
}

impl RoleManager {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    pub async fn current(&self) -> AppResult<RoleConfig> {
        Ok(self.roles.load_role().await?)
    }

    pub async fn require_leader(&self) -> AppResult<RoleConfig> {
        let cfg = self.current().await?;
        if cfg.role != NodeRole::Leader {
            return Err(RoleError::NotLeader.into());
        }
        Ok(cfg)
    }

    pub async fn require_follower(&self) -> AppResult<RoleConfig> {
        let cfg = self.current().await?;
        if cfg.role != NodeRole::Follower {
            return Err(RoleError::NotFollower.into());
        }
        Ok(cfg)
    }

    async fn update<F>(&self, mutate: F) -> AppResult<RoleConfig>
    where
        F: FnOnce(&mut RoleConfig) -> AppResult<()> + Send,
    {
        let mut cfg = self.roles.load_role().await?;
        mutate(&mut cfg)?;
        Ok(self.roles.store_role(&cfg).await?)
    }

    /// Become leader, dropping every trace of a previous leader connection.
    pub async fn become_leader(&self) -> AppResult<RoleConfig> {
        let cfg = self
            .update(|cfg| {
                cfg.role = NodeRole::Leader;
                cfg.leader_host = None;
                cfg.leader_port = None;
                cfg.api_key = None;
                cfg.connected = false;
                cfg.last_connected_at = None;
                cfg.last_applied_digest = None;
                Ok(())
            })
            .await?;
        tracing::info!(version = cfg.version, "Node role set to leader");
        Ok(cfg)
    }

    /// Become follower. Stays disconnected until `connect_to_leader` succeeds.
    ///
    /// The leader-side registry is kept but becomes inert.
    pub async fn become_follower(&self) -> AppResult<RoleConfig> {
        let cfg = self
            .update(|cfg| {
                if cfg.role != NodeRole::Follower {
                    cfg.role = NodeRole::Follower;
                    cfg.connected = false;
                }
                Ok(())
            })
            .await?;
        tracing::info!(version = cfg.version, "Node role set to follower");
        Ok(cfg)
    }

    /// Store leader coordinates, then prove them with one authenticated
    /// round-trip. `connected` is only set once that round-trip succeeds.
    pub async fn connect_to_leader(
        &self,
        request: ConnectRequest,
        client: &LeaderClient,
    ) -> AppResult<(RoleConfig, ConnectionTestResult)> {
        let interval = request.validate()?;
        let host = request.host.trim().to_string();
        let api_key = request.api_key.trim().to_string();

        let pending = self
            .update(|cfg| {
                if cfg.role != NodeRole::Follower {
                    return Err(RoleError::NotFollower.into());
                }
                cfg.leader_host = Some(host);
                cfg.leader_port = Some(request.port);
                cfg.api_key = Some(api_key);
                cfg.sync_interval_secs = interval;
                cfg.connected = false;
                Ok(())
            })
            .await?;

        let base_url = pending.leader_base_url().ok_or(RoleError::NotConnected)?;
        let key = pending.api_key.clone().unwrap_or_default();

        let started = Instant::now();
        let health = match client.health(&base_url, &key).await {
            Ok(health) => health,
            Err(err) => {
                tracing::warn!(leader = %base_url, error = %err, "Leader connection test failed");
                return Err(err.into());
            },
        };
        let result = ConnectionTestResult {
            success: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            leader_status: Some(health.status),
            message: format!("Connected to leader as {}", health.node),
        };

        let expected = pending.version;
        let cfg = self
            .update(move |cfg| {
                if cfg.version != expected {
                    return Err(RoleError::ConcurrentModification { expected_version: expected }.into());
                }
                cfg.connected = true;
                cfg.last_connected_at = Some(Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(leader = %base_url, interval_secs = interval, "Connected to leader");
        Ok((cfg, result))
    }

    /// Stop syncing. Host and port are kept; the credential is dropped.
    pub async fn disconnect_from_leader(&self) -> AppResult<RoleConfig> {
        let cfg = self
            .update(|cfg| {
                if cfg.role != NodeRole::Follower {
                    return Err(RoleError::NotFollower.into());
                }
                cfg.connected = false;
                cfg.api_key = None;
                Ok(())
            })
            .await?;
        tracing::info!("Disconnected from leader");
        Ok(cfg)
    }

    /// Check the configured leader without changing any state.
    pub async fn test_connection(&self, client: &LeaderClient) -> ConnectionTestResult {
        let cfg = match self.current().await {
            Ok(cfg) => cfg,
            Err(err) => return ConnectionTestResult::failed(err.to_string()),
        };
        let (Some(base_url), Some(key)) = (cfg.leader_base_url(), cfg.api_key.as_deref()) else {
            return ConnectionTestResult::failed("No leader configured");
        };
        client.test_connection(&base_url, key).await
    }
}
