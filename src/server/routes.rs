//! Route definitions for the API server

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        // Whole dashboard and per-chart callbacks
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/charts/:chart", get(handlers::get_chart))
        .route("/series/:chart", get(handlers::get_series))
        // Snapshot lifecycle
        .route("/snapshot", get(handlers::get_snapshot))
        .route("/refresh", post(handlers::refresh))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
