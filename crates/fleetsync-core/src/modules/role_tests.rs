#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use fleetsync_types::{NodeRole, RoleError, SyncError, TypedError, ValidationError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::modules::leader_client::{LeaderClient, HEALTH_PATH, SLAVE_KEY_HEADER};
use crate::modules::role::{ConnectRequest, RoleManager};
use crate::test_support::memory_store;

fn client() -> LeaderClient {
    LeaderClient::new(Duration::from_secs(2)).unwrap()
}

fn connect_to(server: &MockServer, key: &str) -> ConnectRequest {
    let address = server.address();
    ConnectRequest {
        host: address.ip().to_string(),
        port: address.port(),
        api_key: key.to_string(),
        sync_interval_secs: Some(30),
    }
}

async fn healthy_leader(key: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .and(header(SLAVE_KEY_HEADER, key))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "node": "edge-1",
            "nodeStatus": "online",
            "timestamp": "2025-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_become_follower_then_leader_clears_connection() {
    let roles = RoleManager::new(memory_store().await);
    let server = healthy_leader("fsk_good").await;

    roles.become_follower().await.unwrap();
    roles.connect_to_leader(connect_to(&server, "fsk_good"), &client()).await.unwrap();

    let leader = roles.become_leader().await.unwrap();
    assert_eq!(leader.role, NodeRole::Leader);
    assert!(leader.leader_host.is_none());
    assert!(leader.leader_port.is_none());
    assert!(leader.api_key.is_none());
    assert!(!leader.connected);
    assert!(leader.last_connected_at.is_none());
}

#[tokio::test]
async fn test_become_follower_starts_disconnected() {
    let roles = RoleManager::new(memory_store().await);
    let cfg = roles.become_follower().await.unwrap();
    assert_eq!(cfg.role, NodeRole::Follower);
    assert!(!cfg.connected);
    assert!(!cfg.should_pull());
}

#[tokio::test]
async fn test_connect_requires_follower_role() {
    let roles = RoleManager::new(memory_store().await);
    let server = healthy_leader("fsk_good").await;

    let err = roles.connect_to_leader(connect_to(&server, "fsk_good"), &client()).await.unwrap_err();
    assert!(matches!(err.typed(), Some(TypedError::Role(RoleError::NotFollower))));
    assert!(roles.current().await.unwrap().leader_host.is_none());
}

#[tokio::test]
async fn test_connect_rejects_short_interval() {
    let roles = RoleManager::new(memory_store().await);
    roles.become_follower().await.unwrap();
    let server = healthy_leader("fsk_good").await;

    let mut request = connect_to(&server, "fsk_good");
    request.sync_interval_secs = Some(5);
    let err = roles.connect_to_leader(request, &client()).await.unwrap_err();
    assert!(matches!(
        err.typed(),
        Some(TypedError::Validation(ValidationError { field, .. })) if field == "syncIntervalSecs"
    ));
}

#[tokio::test]
async fn test_connect_success_marks_connected() {
    let roles = RoleManager::new(memory_store().await);
    roles.become_follower().await.unwrap();
    let server = healthy_leader("fsk_good").await;

    let (cfg, result) =
        roles.connect_to_leader(connect_to(&server, "fsk_good"), &client()).await.unwrap();
    assert!(result.success);
    assert!(cfg.connected);
    assert!(cfg.last_connected_at.is_some());
    assert_eq!(cfg.sync_interval_secs, 30);
    assert_eq!(cfg.api_key.as_deref(), Some("fsk_good"));
    assert!(cfg.should_pull());
}

#[tokio::test]
async fn test_connect_with_rejected_key_stays_disconnected() {
    let roles = RoleManager::new(memory_store().await);
    roles.become_follower().await.unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = roles.connect_to_leader(connect_to(&server, "fsk_bad"), &client()).await.unwrap_err();
    assert!(matches!(
        err.typed(),
        Some(TypedError::Sync(SyncError::LeaderRejected { status: 401, .. }))
    ));

    let cfg = roles.current().await.unwrap();
    assert!(!cfg.connected);
    assert!(cfg.leader_host.is_some());
}

#[tokio::test]
async fn test_disconnect_keeps_coordinates() {
    let roles = RoleManager::new(memory_store().await);
    roles.become_follower().await.unwrap();
    let server = healthy_leader("fsk_good").await;
    roles.connect_to_leader(connect_to(&server, "fsk_good"), &client()).await.unwrap();

    let cfg = roles.disconnect_from_leader().await.unwrap();
    assert!(!cfg.connected);
    assert!(cfg.api_key.is_none());
    assert_eq!(cfg.leader_port, Some(server.address().port()));
}

#[tokio::test]
async fn test_test_connection_without_leader_reports_failure() {
    let roles = RoleManager::new(memory_store().await);
    let result = roles.test_connection(&client()).await;
    assert!(!result.success);
    assert!(result.latency_ms.is_none());
}

#[tokio::test]
async fn test_test_connection_does_not_change_state() {
    let roles = RoleManager::new(memory_store().await);
    roles.become_follower().await.unwrap();
    let server = healthy_leader("fsk_good").await;
    let (before, _) =
        roles.connect_to_leader(connect_to(&server, "fsk_good"), &client()).await.unwrap();

    let result = roles.test_connection(&client()).await;
    assert!(result.success);
    assert_eq!(roles.current().await.unwrap().version, before.version);
}
