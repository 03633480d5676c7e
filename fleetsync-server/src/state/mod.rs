//! Application State
//!
//! Shared state for the daemon: the sync engine built on the SQLite store,
//! the leader client used by followers, and the loaded app config.

use std::sync::Arc;

use anyhow::Result;

use fleetsync_core::modules::registry::NodeRegistry;
use fleetsync_core::modules::role::RoleManager;
use fleetsync_core::{LeaderClient, SqliteStore, SyncEngine};
use fleetsync_types::AppConfig;

/// Environment variable overriding the admin token from the config file.
pub const ADMIN_TOKEN_ENV: &str = "FLEETSYNC_ADMIN_TOKEN";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub engine: SyncEngine,
    pub leader_client: LeaderClient,
    pub config: AppConfig,
    /// Effective admin token (env override applied). Empty denies all.
    pub admin_token: String,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, config: AppConfig) -> Result<Self> {
        let admin_token = resolve_admin_token(&config);
        let leader_client = LeaderClient::new(config.pull_timeout())?;
        let engine = SyncEngine::from_store(store);

        if admin_token.is_empty() {
            tracing::warn!("No admin token configured; admin API will deny every request");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                engine,
                leader_client,
                config,
                admin_token,
            }),
        })
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.inner.engine
    }

    pub fn registry(&self) -> &NodeRegistry {
        self.inner.engine.registry()
    }

    pub fn roles(&self) -> &RoleManager {
        self.inner.engine.roles()
    }

    pub fn leader_client(&self) -> &LeaderClient {
        &self.inner.leader_client
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }
}

fn resolve_admin_token(config: &AppConfig) -> String {
    std::env::var(ADMIN_TOKEN_ENV)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| config.admin_token.clone())
}
