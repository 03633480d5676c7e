use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::middleware::admin_auth_middleware;
use crate::state::AppState;

/// Exports carry certificate material; keep headroom above the axum default.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let admin_api = api::admin_router()
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    let public_routes = Router::<AppState>::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/version", get(version_info));

    admin_api
        .merge(api::node_router())
        .merge(public_routes)
        .fallback(api_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({"status": "ok"})))
}

async fn version_info() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "version": option_env!("GIT_VERSION").unwrap_or("dev"),
            "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
            "cargo_version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, axum::Json(serde_json::json!({"error": "Not found"})))
}
