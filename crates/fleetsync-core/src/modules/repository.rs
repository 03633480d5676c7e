//! Storage traits for nodes, proxy configuration and the role record.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetsync_types::{Category, CategoryCounts, NodeIdentity, RoleConfig, Snapshot};

pub type RepoResult<T> = Result<T, RepositoryError>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Node not found: {0}")]
    NotFound(String),
    #[error("Node already exists: {0}")]
    AlreadyExists(String),
    #[error("Role record changed concurrently (expected version {expected_version})")]
    Conflict { expected_version: i64 },
    /// SQLite reported SQLITE_BUSY / SQLITE_LOCKED; retrying may succeed.
    #[error("Database busy: {0}")]
    Busy(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A node row about to be inserted. The plaintext key never gets this far.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub api_key_hash: String,
    pub sync_interval_secs: u32,
}

/// Role-record guard applied inside an import transaction.
///
/// The import commits only if the role row still has `expected_version`
/// and still says follower.
#[derive(Debug, Clone)]
pub struct ImportFence {
    pub expected_version: i64,
    pub digest: String,
    pub applied_at: DateTime<Utc>,
}

#[async_trait]
pub trait NodeRepository: Send + Sync {
    async fn insert_node(&self, node: NewNode) -> RepoResult<NodeIdentity>;
    async fn list_nodes(&self) -> RepoResult<Vec<NodeIdentity>>;
    async fn get_node(&self, id: &str) -> RepoResult<NodeIdentity>;
    /// Returns the node together with its stored key hash.
    async fn find_by_key_hash(&self, key_hash: &str)
        -> RepoResult<Option<(NodeIdentity, String)>>;
    async fn delete_node(&self, id: &str) -> RepoResult<()>;
    async fn set_sync_enabled(&self, id: &str, enabled: bool) -> RepoResult<NodeIdentity>;
    /// Stamp a successful pull: status online, last_seen, last_known_digest.
    async fn record_contact(&self, id: &str, digest: &str, at: DateTime<Utc>) -> RepoResult<()>;
    /// Mark offline every online node whose stored `last_seen` is older than
    /// `multiplier` of its own sync intervals at `now`. The check and the
    /// write are one statement. Returns the names that changed.
    async fn mark_stale(&self, now: DateTime<Utc>, multiplier: u32) -> RepoResult<Vec<String>>;
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Read every category inside one read transaction.
    async fn load_snapshot(&self) -> RepoResult<Snapshot>;
    /// Upsert the given entities by business key. Operator-side writes.
    async fn save_entities(&self, entities: &Snapshot) -> RepoResult<()>;
    /// Reconcile `incoming` into local storage and stamp the role record,
    /// all-or-nothing.
    async fn apply_snapshot(
        &self,
        incoming: &Snapshot,
        fence: &ImportFence,
    ) -> RepoResult<BTreeMap<Category, CategoryCounts>>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn load_role(&self) -> RepoResult<RoleConfig>;
    /// Compare-and-swap on `next.version`; returns the stored record with
    /// its bumped version.
    async fn store_role(&self, next: &RoleConfig) -> RepoResult<RoleConfig>;
}
