//! HTTP router construction.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the read-only API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/metrics", get(api::metrics))
        .route("/api/analysis", get(api::analysis))
        .route("/api/prediction", get(api::prediction))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
