//! Role state machine handlers.

use axum::{extract::State, response::Json};
use serde::Serialize;

use fleetsync_core::ConnectRequest;
use fleetsync_types::{ConnectionTestResult, RoleConfig};

use super::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub role: RoleConfig,
    pub test: ConnectionTestResult,
}

pub async fn get_role(State(state): State<AppState>) -> ApiResult<RoleConfig> {
    Ok(Json(state.roles().current().await?))
}

pub async fn become_leader(State(state): State<AppState>) -> ApiResult<RoleConfig> {
    Ok(Json(state.roles().become_leader().await?))
}

pub async fn become_follower(State(state): State<AppState>) -> ApiResult<RoleConfig> {
    Ok(Json(state.roles().become_follower().await?))
}

pub async fn connect(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> ApiResult<ConnectResponse> {
    let (role, test) = state.roles().connect_to_leader(request, state.leader_client()).await?;
    Ok(Json(ConnectResponse { role, test }))
}

pub async fn disconnect(State(state): State<AppState>) -> ApiResult<RoleConfig> {
    Ok(Json(state.roles().disconnect_from_leader().await?))
}

pub async fn test_connection(State(state): State<AppState>) -> Json<ConnectionTestResult> {
    Json(state.roles().test_connection(state.leader_client()).await)
}
