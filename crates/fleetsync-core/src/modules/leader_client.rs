//! HTTP client a follower uses to reach its leader.

use std::time::{Duration, Instant};

use fleetsync_types::{ConnectionTestResult, ExportResponse, HealthRecord, SyncError};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Header carrying a follower's key on follower → leader calls.
pub const SLAVE_KEY_HEADER: &str = "x-slave-api-key";
/// Header carrying the follower's held key on calls into a follower.
pub const NODE_KEY_HEADER: &str = "x-api-key";

pub const EXPORT_PATH: &str = "/api/sync/export";
pub const HEALTH_PATH: &str = "/api/sync/health";

const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct LeaderClient {
    http: Client,
}

impl LeaderClient {
    /// Client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client builder failed: {e}")))?;
        Ok(Self { http })
    }

    /// Fetch the leader's current snapshot.
    pub async fn export(&self, base_url: &str, api_key: &str) -> Result<ExportResponse, SyncError> {
        self.get(base_url, EXPORT_PATH, api_key).await
    }

    /// Authenticated health check.
    pub async fn health(&self, base_url: &str, api_key: &str) -> Result<HealthRecord, SyncError> {
        self.get(base_url, HEALTH_PATH, api_key).await
    }

    /// One timed health round-trip. Failures are reported, never raised.
    pub async fn test_connection(&self, base_url: &str, api_key: &str) -> ConnectionTestResult {
        let started = Instant::now();
        match self.health(base_url, api_key).await {
            Ok(health) => ConnectionTestResult {
                success: true,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                leader_status: Some(health.status),
                message: format!("Connected to leader as {}", health.node),
            },
            Err(err) => ConnectionTestResult::failed(err.to_string()),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        base_url: &str,
        path: &str,
        api_key: &str,
    ) -> Result<T, SyncError> {
        let url = format!("{}{path}", base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .header(SLAVE_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| SyncError::TransientNetwork { message: describe_transport(&e) })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::TransientNetwork { message: describe_transport(&e) })?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| SyncError::InvalidResponse { message: e.to_string() })
    }
}

fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

/// 5xx and 429 are worth retrying; everything else is a refusal.
fn classify_status(status: StatusCode, body: &str) -> SyncError {
    let message: String = body.chars().take(MAX_ERROR_BODY).collect();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        SyncError::TransientNetwork { message: format!("leader returned {status}: {message}") }
    } else {
        SyncError::LeaderRejected { status: status.as_u16(), message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsync_types::Snapshot;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> LeaderClient {
        LeaderClient::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_export_sends_slave_key_header() {
        let server = MockServer::start().await;
        let body = ExportResponse { hash: "abc".into(), config: Snapshot::default() };
        Mock::given(method("GET"))
            .and(path(EXPORT_PATH))
            .and(header(SLAVE_KEY_HEADER, "fsk_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let export = client().export(&server.uri(), "fsk_test").await.unwrap();
        assert_eq!(export, body);
    }

    #[tokio::test]
    async fn test_unauthorized_is_leader_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPORT_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unknown or revoked API key"))
            .mount(&server)
            .await;

        let err = client().export(&server.uri(), "fsk_bad").await.unwrap_err();
        assert!(matches!(err, SyncError::LeaderRejected { status: 401, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPORT_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client().export(&server.uri(), "fsk_test").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXPORT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client().export(&server.uri(), "fsk_test").await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_leader_is_transient() {
        // Port 9 (discard) on loopback is closed in test environments.
        let err = client().export("http://127.0.0.1:9", "fsk_test").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_connection_reports_latency_on_success() {
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

        let result = client().test_connection(&server.uri(), "fsk_test").await;
        assert!(result.success);
        assert!(result.latency_ms.is_some());
        assert_eq!(result.leader_status.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported_not_raised() {
        let result = client().test_connection("http://127.0.0.1:9", "fsk_test").await;
        assert!(!result.success);
        assert!(result.latency_ms.is_none());
        assert!(!result.message.is_empty());
    }
}
