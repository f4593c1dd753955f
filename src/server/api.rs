//! API route definitions

use std::sync::Arc;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::{handlers, state::AppState};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/", get(handlers::home))
        .route("/predict", post(handlers::predict))
        .fallback(handlers::handle_404)
        .method_not_allowed_fallback(handlers::handle_405)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
