use axum::{extract::State, http::HeaderMap, response::Json};

use fleetsync_core::modules::leader_client::NODE_KEY_HEADER;
use fleetsync_types::DigestReport;

use super::error::ApiResult;
use super::header_value;
use crate::state::AppState;

/// Follower: report the local digest to a caller holding the same key
/// this follower uses against its leader.
pub async fn node_digest(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<DigestReport> {
    state.engine().verify_held_key(header_value(&headers, NODE_KEY_HEADER)).await?;
    Ok(Json(state.engine().report_local_digest().await?))
}
