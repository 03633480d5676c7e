//! SQLite implementation of the node, config and role repositories.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetsync_types::{
    Category, CategoryCounts, NodeIdentity, RoleConfig, Snapshot,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::modules::repository::{
    ConfigRepository, ImportFence, NewNode, NodeRepository, RepoResult, RepositoryError,
    RoleRepository,
};
use crate::modules::sqlite_config::{
    apply_snapshot_impl, load_snapshot_impl, save_entities_impl,
};
use crate::modules::sqlite_nodes::{
    delete_node_impl, find_by_key_hash_impl, get_node_impl, insert_node_impl, list_nodes_impl,
    mark_stale_impl, record_contact_impl, set_sync_enabled_impl,
};
use crate::modules::sqlite_role::{load_role_impl, store_role_impl};

/// SQLite-backed store shared by every service.
#[derive(Clone)]
pub struct SqliteStore {
    /// Database connection pool.
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    /// Create store with existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database; one connection that never recycles.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| RepositoryError::Database(err.to_string()))
    }
}

#[async_trait]
impl NodeRepository for SqliteStore {
    async fn insert_node(&self, node: NewNode) -> RepoResult<NodeIdentity> {
        insert_node_impl(&self.pool, node).await
    }

    async fn list_nodes(&self) -> RepoResult<Vec<NodeIdentity>> {
        list_nodes_impl(&self.pool).await
    }

    async fn get_node(&self, id: &str) -> RepoResult<NodeIdentity> {
        get_node_impl(&self.pool, id).await
    }

    async fn find_by_key_hash(
        &self,
        key_hash: &str,
    ) -> RepoResult<Option<(NodeIdentity, String)>> {
        find_by_key_hash_impl(&self.pool, key_hash).await
    }

    async fn delete_node(&self, id: &str) -> RepoResult<()> {
        delete_node_impl(&self.pool, id).await
    }

    async fn set_sync_enabled(&self, id: &str, enabled: bool) -> RepoResult<NodeIdentity> {
        set_sync_enabled_impl(&self.pool, id, enabled).await
    }

    async fn record_contact(&self, id: &str, digest: &str, at: DateTime<Utc>) -> RepoResult<()> {
        record_contact_impl(&self.pool, id, digest, at).await
    }

    async fn mark_stale(&self, now: DateTime<Utc>, multiplier: u32) -> RepoResult<Vec<String>> {
        mark_stale_impl(&self.pool, now, multiplier).await
    }
}

#[async_trait]
impl ConfigRepository for SqliteStore {
    async fn load_snapshot(&self) -> RepoResult<Snapshot> {
        load_snapshot_impl(&self.pool).await
    }

    async fn save_entities(&self, entities: &Snapshot) -> RepoResult<()> {
        save_entities_impl(&self.pool, entities).await
    }

    async fn apply_snapshot(
        &self,
        incoming: &Snapshot,
        fence: &ImportFence,
    ) -> RepoResult<BTreeMap<Category, CategoryCounts>> {
        apply_snapshot_impl(&self.pool, incoming, fence).await
    }
}

#[async_trait]
impl RoleRepository for SqliteStore {
    async fn load_role(&self) -> RepoResult<RoleConfig> {
        load_role_impl(&self.pool).await
    }

    async fn store_role(&self, next: &RoleConfig) -> RepoResult<RoleConfig> {
        store_role_impl(&self.pool, next).await
    }
}
