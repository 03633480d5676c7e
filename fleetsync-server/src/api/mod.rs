//! API Routes
//!
//! Two surfaces share the `/api` prefix:
//! - admin routes, guarded by the bearer admin token
//! - node routes, authenticated by per-node API keys in headers

pub mod error;
mod node_diag;
mod nodes;
mod role;
mod sync;

#[cfg(test)]
mod nodes_tests;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Routes that require the admin bearer token.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        // Node registry (leader)
        .route("/api/nodes", get(nodes::list_nodes).post(nodes::register_node))
        .route("/api/nodes/:id", get(nodes::get_node).delete(nodes::delete_node))
        .route("/api/nodes/:id/sync", post(nodes::set_node_sync))
        // Role state machine
        .route("/api/role", get(role::get_role))
        .route("/api/role/leader", post(role::become_leader))
        .route("/api/role/follower", post(role::become_follower))
        .route("/api/role/connect", post(role::connect))
        .route("/api/role/disconnect", post(role::disconnect))
        .route("/api/role/test", post(role::test_connection))
        // Local sync controls
        .route("/api/sync/digest", get(sync::local_digest))
        .route("/api/sync/pull", post(sync::pull_now))
}

/// Routes authenticated by node API keys.
pub fn node_router() -> Router<AppState> {
    Router::new()
        // follower → leader, x-slave-api-key
        .route("/api/sync/export", get(sync::export))
        .route("/api/sync/health", get(sync::leader_health))
        // leader/diagnostic → follower, x-api-key
        .route("/api/node/digest", get(node_diag::node_digest))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
