//! Sync protocol handlers.

use axum::{extract::State, http::HeaderMap, response::Json};
use serde::Serialize;

use fleetsync_core::modules::leader_client::SLAVE_KEY_HEADER;
use fleetsync_types::{DigestReport, ExportResponse, HealthRecord, ImportOutcome};

use super::error::ApiResult;
use super::header_value;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PullResponse {
    /// True when another pull held the guard and this one did nothing
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ImportOutcome>,
}

/// Leader: serve the snapshot to an authenticated follower.
pub async fn export(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<ExportResponse> {
    let key = header_value(&headers, SLAVE_KEY_HEADER);
    Ok(Json(state.engine().export(key).await?))
}

/// Leader: authenticated liveness check used by `role test` / `role connect`.
pub async fn leader_health(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<HealthRecord> {
    let key = header_value(&headers, SLAVE_KEY_HEADER);
    Ok(Json(state.engine().leader_health(key).await?))
}

pub async fn local_digest(State(state): State<AppState>) -> ApiResult<DigestReport> {
    Ok(Json(state.engine().report_local_digest().await?))
}

/// Follower: pull now, sharing the scheduler's guard.
pub async fn pull_now(State(state): State<AppState>) -> ApiResult<PullResponse> {
    let outcome = state.engine().pull(state.leader_client()).await?;
    Ok(Json(PullResponse { skipped: outcome.is_none(), outcome }))
}
