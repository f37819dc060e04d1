//! HTTP API route definitions.

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::error::{default_description, panic_response, render_envelope, ApiError};
use super::handlers::{county_data, healthz, metrics_text, AppState};

/// Default request body limit.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Create the API router with the default body limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_limit(state, DEFAULT_BODY_LIMIT)
}

/// Create the API router.
///
/// Layer order, outermost first: tracing, panic capture, envelope rendering.
pub fn create_router_with_limit(state: AppState, body_limit: usize) -> Router {
    Router::new()
        // Probes
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_text))
        // Lookup
        .route("/county_data", post(county_data))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(map_response(render_envelope)),
        )
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound(default_description(StatusCode::NOT_FOUND))
}
