//! Mapping from core errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use fleetsync_core::AppError;
use fleetsync_types::{AuthError, NodeError, SyncError, TypedError};

/// Handler error: any core error, rendered as `{"error": ..}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn status_for(err: &AppError) -> StatusCode {
    if matches!(err, AppError::Busy(_)) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    let Some(typed) = err.typed() else {
        return StatusCode::INTERNAL_SERVER_ERROR;
    };
    match typed {
        TypedError::Validation(_) => StatusCode::BAD_REQUEST,
        TypedError::Node(NodeError::Duplicate { .. }) => StatusCode::CONFLICT,
        TypedError::Node(NodeError::NotFound { .. }) => StatusCode::NOT_FOUND,
        TypedError::Auth(AuthError::SyncDisabled { .. }) => StatusCode::FORBIDDEN,
        TypedError::Auth(_) => StatusCode::UNAUTHORIZED,
        TypedError::Sync(SyncError::Reconciliation { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        TypedError::Sync(_) => StatusCode::BAD_GATEWAY,
        TypedError::Role(_) => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!("API error ({}): {}", status, self.0);
        } else {
            tracing::debug!("API error ({}): {}", status, self.0);
        }

        let mut body = serde_json::json!({ "error": self.0.to_string() });
        if let Some(typed) = self.0.typed() {
            body["details"] = serde_json::to_value(typed).unwrap_or_default();
        }
        (status, Json(body)).into_response()
    }
}
