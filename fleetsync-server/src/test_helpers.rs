//! Test helpers for fleetsync-server unit tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;

use fleetsync_core::modules::registry::RegisterNode;
use fleetsync_core::modules::repository::ConfigRepository;
use fleetsync_core::SqliteStore;
use fleetsync_types::{AppConfig, Backend, DomainConfig, Snapshot};

use crate::router::build_router;
use crate::state::AppState;

pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Fresh `AppState` over an in-memory database, acting as leader.
pub async fn test_app_state() -> AppState {
    let store = SqliteStore::in_memory().await.expect("failed to open in-memory sqlite");
    store.run_migrations().await.expect("failed to run migrations");

    let config = AppConfig { admin_token: TEST_ADMIN_TOKEN.to_string(), ..AppConfig::new() };
    AppState::new(std::sync::Arc::new(store), config).expect("failed to create test AppState")
}

pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state)).expect("failed to start test server")
}

pub fn admin_auth() -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {TEST_ADMIN_TOKEN}")).unwrap(),
    )
}

pub fn key_header(name: &'static str, key: &str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static(name), HeaderValue::from_str(key).unwrap())
}

/// Register a follower on a leader state and return its plaintext key.
pub async fn register_follower(state: &AppState, name: &str) -> String {
    state
        .registry()
        .register(RegisterNode {
            name: name.to_string(),
            host: "10.0.0.9".to_string(),
            port: 8070,
            sync_interval_secs: None,
        })
        .await
        .unwrap()
        .api_key
}

pub async fn add_domains(state: &AppState, names: &[&str]) {
    let domains = names
        .iter()
        .map(|d| DomainConfig::new(*d, Backend { address: "10.0.0.1".into(), port: 80, weight: 1 }))
        .collect();
    state
        .engine()
        .config_store()
        .save_entities(&Snapshot { domains, ..Default::default() })
        .await
        .unwrap();
}
