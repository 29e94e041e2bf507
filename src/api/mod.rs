//! HTTP API module
//!
//! Endpoint handlers and response structures for driving the timer over HTTP.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/start", post(start_handler))
        .route("/pause", post(pause_handler))
        .route("/reset", post(reset_handler))
        .route("/lap", post(lap_handler))
        .route("/laps/clear", post(clear_laps_handler))
        .route("/preset/:preset_id", post(preset_handler))
        .route("/mode/toggle", post(toggle_mode_handler))
        .route("/status", get(status_handler))
        .route("/presets", get(presets_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
