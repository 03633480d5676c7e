#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use fleetsync_types::{NodeIdentity, NodeStatus, RegisteredNode};

use super::nodes::list_nodes;
use crate::test_helpers::{admin_auth, register_follower, test_app_state, test_server};

#[tokio::test]
async fn test_list_nodes_empty() {
    let state = test_app_state().await;
    let Json(nodes) = list_nodes(State(state)).await.unwrap();
    assert!(nodes.is_empty());
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let server = test_server(test_app_state().await);

    server.get("/api/nodes").await.assert_status(StatusCode::UNAUTHORIZED);

    let (name, _) = admin_auth();
    server
        .get("/api/nodes")
        .add_header(name, "Bearer wrong-token".parse::<axum::http::HeaderValue>().unwrap())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found_without_token() {
    let server = test_server(test_app_state().await);
    server.get("/api/does-not-exist").await.assert_status(StatusCode::NOT_FOUND);
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_register_returns_key_once() {
    let server = test_server(test_app_state().await);
    let (name, value) = admin_auth();

    let response = server
        .post("/api/nodes")
        .add_header(name.clone(), value.clone())
        .json(&serde_json::json!({ "name": "edge-1", "host": "10.0.0.2", "port": 8070 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let registered: RegisteredNode = response.json();
    assert!(registered.api_key.starts_with("fsk_"));
    assert_eq!(registered.status, NodeStatus::Offline);

    let listed = server.get("/api/nodes").add_header(name, value).await;
    listed.assert_status_ok();
    let body: serde_json::Value = listed.json();
    assert_eq!(body[0]["name"], "edge-1");
    assert!(body[0].get("apiKey").is_none());
    assert!(body[0].get("apiKeyHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_and_invalid() {
    let server = test_server(test_app_state().await);
    let (name, value) = admin_auth();
    let body = serde_json::json!({ "name": "edge-1", "host": "10.0.0.2", "port": 8070 });

    server
        .post("/api/nodes")
        .add_header(name.clone(), value.clone())
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/nodes")
        .add_header(name.clone(), value.clone())
        .json(&body)
        .await
        .assert_status(StatusCode::CONFLICT);

    let invalid = server
        .post("/api/nodes")
        .add_header(name, value)
        .json(&serde_json::json!({ "name": "bad name!", "host": "10.0.0.2", "port": 0 }))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
    let err: serde_json::Value = invalid.json();
    assert_eq!(err["details"]["domain"], "Validation");
}

#[tokio::test]
async fn test_get_toggle_delete() {
    let state = test_app_state().await;
    register_follower(&state, "edge-1").await;
    let id = state.registry().list().await.unwrap()[0].id.clone();
    let server = test_server(state);
    let (name, value) = admin_auth();

    let node: NodeIdentity = server
        .get(&format!("/api/nodes/{id}"))
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert!(node.sync_enabled);

    let toggled: NodeIdentity = server
        .post(&format!("/api/nodes/{id}/sync"))
        .add_header(name.clone(), value.clone())
        .json(&serde_json::json!({ "enabled": false }))
        .await
        .json();
    assert!(!toggled.sync_enabled);

    server
        .delete(&format!("/api/nodes/{id}"))
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/nodes/{id}"))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_node_routes_refused_on_follower() {
    let state = test_app_state().await;
    state.roles().become_follower().await.unwrap();
    let server = test_server(state);
    let (name, value) = admin_auth();

    let response = server.get("/api/nodes").add_header(name, value).await;
    response.assert_status(StatusCode::CONFLICT);
    let err: serde_json::Value = response.json();
    assert_eq!(err["details"]["error"]["type"], "NotLeader");
}
