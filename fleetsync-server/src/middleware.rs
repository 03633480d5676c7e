use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::state::AppState;

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Bearer-token guard for admin routes. An empty configured token denies.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if method == axum::http::Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let expected = state.inner.admin_token.as_str();
    if expected.is_empty() {
        tracing::error!("Admin auth is required but no admin token is configured");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    if presented.is_some_and(|token| constant_time_compare(token.trim(), expected)) {
        tracing::debug!("Admin request: {} {}", method, path);
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Rejected admin request: {} {}", method, path);
        Err(StatusCode::UNAUTHORIZED)
    }
}
