#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use fleetsync_types::{
    AuthError, Category, CategoryCounts, ExportResponse, NodeRole, NodeStatus, RoleError,
    Snapshot, SyncError, TypedError, UserAccount,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::error::AppError;
use crate::modules::database::SqliteStore;
use crate::modules::digest::digest;
use crate::modules::leader_client::{LeaderClient, EXPORT_PATH, HEALTH_PATH};
use crate::modules::registry::RegisterNode;
use crate::modules::repository::{
    ConfigRepository, ImportFence, RepoResult, RepositoryError, RoleRepository,
};
use crate::modules::role::ConnectRequest;
use crate::modules::sync_engine::SyncEngine;
use crate::test_support::{domain, memory_store};

struct Node {
    store: Arc<SqliteStore>,
    engine: SyncEngine,
}

async fn node() -> Node {
    let store = memory_store().await;
    let engine = SyncEngine::from_store(store.clone());
    Node { store, engine }
}

async fn follower() -> Node {
    let n = node().await;
    n.engine.roles().become_follower().await.unwrap();
    n
}

async fn register(leader: &Node, name: &str) -> (String, String) {
    let registered = leader
        .engine
        .registry()
        .register(RegisterNode {
            name: name.into(),
            host: "10.0.0.9".into(),
            port: 8070,
            sync_interval_secs: None,
        })
        .await
        .unwrap();
    (registered.id, registered.api_key)
}

/// Rows written on the store's single connection since it opened.
async fn total_changes(n: &Node) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT total_changes()")
        .fetch_one(&n.store.pool)
        .await
        .unwrap()
}

async fn add_domains(n: &Node, names: &[&str]) {
    let domains = names.iter().map(|d| domain(d, 80)).collect();
    n.store.save_entities(&Snapshot { domains, ..Default::default() }).await.unwrap();
}

#[tokio::test]
async fn test_leader_to_follower_convergence() {
    let leader = node().await;
    let follower = follower().await;
    let (_, key) = register(&leader, "edge-1").await;

    add_domains(&leader, &["a.com"]).await;
    let export = leader.engine.export(Some(&key)).await.unwrap();
    let first = follower.engine.import(&export).await.unwrap();
    assert!(first.imported);
    assert_eq!(first.changes, 1);

    add_domains(&leader, &["b.com"]).await;
    let export = leader.engine.export(Some(&key)).await.unwrap();
    let second = follower.engine.import(&export).await.unwrap();
    assert_eq!(second.changes, 1);
    assert_eq!(
        second.details.as_ref().unwrap()[&Category::Domains],
        CategoryCounts { created: 1, updated: 0 }
    );

    let role_before = follower.store.load_role().await.unwrap();
    let writes_before = total_changes(&follower).await;
    let third = follower.engine.import(&export).await.unwrap();
    assert!(!third.imported);
    assert_eq!(third.changes, 0);
    assert_eq!(total_changes(&follower).await, writes_before);
    assert_eq!(follower.store.load_role().await.unwrap(), role_before);

    let leader_digest = leader.engine.report_local_digest().await.unwrap();
    let follower_digest = follower.engine.report_local_digest().await.unwrap();
    assert_eq!(leader_digest.hash, follower_digest.hash);
    assert_eq!(follower_digest.last_applied_digest.as_deref(), Some(export.hash.as_str()));
    assert_eq!(follower_digest.role, NodeRole::Follower);
}

#[tokio::test]
async fn test_export_records_contact() {
    let leader = node().await;
    let (id, key) = register(&leader, "edge-1").await;

    let export = leader.engine.export(Some(&key)).await.unwrap();
    let stored = leader.engine.registry().get(&id).await.unwrap();
    assert_eq!(stored.status, NodeStatus::Online);
    assert!(stored.last_seen.is_some());
    assert_eq!(stored.last_known_digest, Some(export.hash));
}

#[tokio::test]
async fn test_update_overwrites_by_business_key() {
    let leader = node().await;
    let follower = follower().await;
    let (_, key) = register(&leader, "edge-1").await;

    add_domains(&follower, &["a.com"]).await;
    leader
        .store
        .save_entities(&Snapshot { domains: vec![domain("a.com", 9000)], ..Default::default() })
        .await
        .unwrap();

    let export = leader.engine.export(Some(&key)).await.unwrap();
    let outcome = follower.engine.import(&export).await.unwrap();
    assert_eq!(
        outcome.details.unwrap()[&Category::Domains],
        CategoryCounts { created: 0, updated: 1 }
    );
    assert_eq!(follower.store.load_snapshot().await.unwrap().domains, vec![domain("a.com", 9000)]);
}

#[tokio::test]
async fn test_follower_only_entities_are_retained() {
    let leader = node().await;
    let follower = follower().await;
    let (_, key) = register(&leader, "edge-1").await;

    add_domains(&leader, &["a.com"]).await;
    add_domains(&follower, &["local.example"]).await;

    let export = leader.engine.export(Some(&key)).await.unwrap();
    follower.engine.import(&export).await.unwrap();

    let names: Vec<String> = follower
        .store
        .load_snapshot()
        .await
        .unwrap()
        .domains
        .into_iter()
        .map(|d| d.domain)
        .collect();
    assert_eq!(names, vec!["a.com".to_string(), "local.example".to_string()]);

    // Extra local state keeps the digests apart.
    let follower_digest = follower.engine.report_local_digest().await.unwrap();
    assert_ne!(follower_digest.hash, export.hash);
}

#[tokio::test]
async fn test_tampered_payload_is_rejected_without_writes() {
    let leader = node().await;
    let follower = follower().await;
    let (_, key) = register(&leader, "edge-1").await;
    add_domains(&leader, &["a.com"]).await;

    let mut export = leader.engine.export(Some(&key)).await.unwrap();
    export.config.users.push(UserAccount {
        username: "intruder".into(),
        password_hash: "x".into(),
        role: "admin".into(),
        enabled: true,
    });

    let err = follower.engine.import(&export).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Sync(SyncError::Reconciliation { .. }))));
    assert_eq!(follower.store.load_snapshot().await.unwrap().total(), 0);
    let role = follower.engine.roles().current().await.unwrap();
    assert!(role.last_applied_digest.is_none());
}

#[tokio::test]
async fn test_duplicate_business_keys_are_rejected_without_writes() {
    let follower = follower().await;
    let config =
        Snapshot { domains: vec![domain("a.com", 80), domain("a.com", 81)], ..Default::default() };
    let export = ExportResponse { hash: digest(&config).unwrap(), config };

    let role_before = follower.store.load_role().await.unwrap();
    let writes_before = total_changes(&follower).await;
    let err = follower.engine.import(&export).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Sync(SyncError::Reconciliation { .. }))));
    assert!(err.to_string().contains("a.com"));

    assert_eq!(total_changes(&follower).await, writes_before);
    assert_eq!(follower.store.load_role().await.unwrap(), role_before);
    assert_eq!(follower.store.load_snapshot().await.unwrap().total(), 0);
}

/// Config store whose import transaction always hits a locked database.
struct LockedConfig {
    inner: Arc<SqliteStore>,
}

#[async_trait]
impl ConfigRepository for LockedConfig {
    async fn load_snapshot(&self) -> RepoResult<Snapshot> {
        self.inner.load_snapshot().await
    }

    async fn save_entities(&self, entities: &Snapshot) -> RepoResult<()> {
        self.inner.save_entities(entities).await
    }

    async fn apply_snapshot(
        &self,
        _incoming: &Snapshot,
        _fence: &ImportFence,
    ) -> RepoResult<BTreeMap<Category, CategoryCounts>> {
        Err(RepositoryError::Busy("database is locked".into()))
    }
}

#[tokio::test]
async fn test_locked_database_during_import_is_transient() {
    let store = memory_store().await;
    let locked = Arc::new(LockedConfig { inner: store.clone() });
    let engine = SyncEngine::new(store.clone(), locked, store.clone());
    engine.roles().become_follower().await.unwrap();

    let config = Snapshot { domains: vec![domain("a.com", 80)], ..Default::default() };
    let export = ExportResponse { hash: digest(&config).unwrap(), config };

    let err = engine.import(&export).await.unwrap_err();
    assert!(matches!(err, AppError::Busy(_)));
    assert!(err.is_transient());
    assert!(engine.roles().current().await.unwrap().last_applied_digest.is_none());
}

#[tokio::test]
async fn test_role_gates() {
    let leader = node().await;
    let follower = follower().await;
    let (_, key) = register(&leader, "edge-1").await;
    let export = leader.engine.export(Some(&key)).await.unwrap();

    let err = leader.engine.import(&export).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Role(RoleError::NotFollower))));

    let err = follower.engine.export(Some(&key)).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Role(RoleError::NotLeader))));
}

#[tokio::test]
async fn test_disabled_node_cannot_export() {
    let leader = node().await;
    let (id, key) = register(&leader, "edge-1").await;
    leader.engine.registry().set_sync_enabled(&id, false).await.unwrap();

    let err = leader.engine.export(Some(&key)).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Auth(AuthError::SyncDisabled { .. }))));

    let stored = leader.engine.registry().get(&id).await.unwrap();
    assert!(stored.last_seen.is_none());
}

#[tokio::test]
async fn test_verify_held_key() {
    let follower = follower().await;
    let err = follower.engine.verify_held_key(Some("fsk_any")).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Auth(AuthError::UnknownKey))));

    let err = follower.engine.verify_held_key(None).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Auth(AuthError::MissingKey { .. }))));
}

async fn mock_leader(export: &ExportResponse) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "node": "edge-1",
            "nodeStatus": "online",
            "timestamp": "2025-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(export))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_pull_round_trip_and_busy_guard() {
    let leader = node().await;
    let follower = follower().await;
    let (_, key) = register(&leader, "edge-1").await;
    add_domains(&leader, &["a.com", "b.com"]).await;
    let export = leader.engine.export(Some(&key)).await.unwrap();

    let server = mock_leader(&export).await;
    let client = LeaderClient::new(Duration::from_secs(2)).unwrap();
    follower
        .engine
        .roles()
        .connect_to_leader(
            ConnectRequest {
                host: server.address().ip().to_string(),
                port: server.address().port(),
                api_key: key.clone(),
                sync_interval_secs: Some(10),
            },
            &client,
        )
        .await
        .unwrap();

    let outcome = follower.engine.pull(&client).await.unwrap().unwrap();
    assert_eq!(outcome.changes, 2);

    {
        let _held = follower.engine.pull_guard.lock().await;
        assert!(follower.engine.pull(&client).await.unwrap().is_none());
    }

    let again = follower.engine.pull(&client).await.unwrap().unwrap();
    assert!(!again.imported);
}

#[tokio::test]
async fn test_pull_requires_connection() {
    let follower = follower().await;
    let client = LeaderClient::new(Duration::from_secs(2)).unwrap();
    let err = follower.engine.pull(&client).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Role(RoleError::NotConnected))));
}
