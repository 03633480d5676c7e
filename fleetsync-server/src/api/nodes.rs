//! Node registry handlers. Leader only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use fleetsync_core::modules::registry::RegisterNode;
use fleetsync_types::{NodeIdentity, RegisteredNode};

use super::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncToggle {
    pub enabled: bool,
}

pub async fn list_nodes(State(state): State<AppState>) -> ApiResult<Vec<NodeIdentity>> {
    state.roles().require_leader().await?;
    Ok(Json(state.registry().list().await?))
}

pub async fn register_node(
    State(state): State<AppState>,
    Json(request): Json<RegisterNode>,
) -> Result<(StatusCode, Json<RegisteredNode>), ApiError> {
    state.roles().require_leader().await?;
    let registered = state.registry().register(request).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<NodeIdentity> {
    state.roles().require_leader().await?;
    Ok(Json(state.registry().get(&id).await?))
}

pub async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.roles().require_leader().await?;
    state.registry().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_node_sync(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(toggle): Json<SyncToggle>,
) -> ApiResult<NodeIdentity> {
    state.roles().require_leader().await?;
    Ok(Json(state.registry().set_sync_enabled(&id, toggle.enabled).await?))
}
