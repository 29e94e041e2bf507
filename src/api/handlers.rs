//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{info, warn};

use crate::{
    format::format_hms,
    state::{clamp_i64, AppState},
};
use super::responses::{
    ApiError, ApiResponse, HealthResponse, PresetsResponse, StatusResponse,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Handle POST /start - Open a running interval
pub async fn start_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    match state.start() {
        Ok(timer) => Ok(Json(ApiResponse::ok("Timer running", timer))),
        Err(e) => {
            warn!("Start rejected: {}", e);
            Err(e.into())
        }
    }
}

/// Handle POST /pause - Fold the open interval and stop
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.pause()?;
    Ok(Json(ApiResponse::ok("Timer paused", timer)))
}

/// Handle POST /reset - Zero the run state
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.reset()?;
    Ok(Json(ApiResponse::ok("Timer reset", timer)))
}

/// Handle POST /lap - Record a lap snapshot
pub async fn lap_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let (lap_ms, timer) = state.record_lap()?;
    let message = format!("Lap recorded at {}", format_hms(clamp_i64(lap_ms)));
    Ok(Json(ApiResponse::ok(message, timer)))
}

/// Handle POST /laps/clear - Empty the lap history
pub async fn clear_laps_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.clear_laps()?;
    Ok(Json(ApiResponse::ok("Laps cleared", timer)))
}

/// Handle POST /preset/:preset_id - Select a countdown preset
pub async fn preset_handler(
    State(state): State<Arc<AppState>>,
    Path(preset_id): Path<String>,
) -> ApiResult<ApiResponse> {
    match state.apply_preset(&preset_id) {
        Ok(timer) => {
            info!("Preset endpoint called - {} selected", preset_id);
            Ok(Json(ApiResponse::ok(format!("Preset {} selected", preset_id), timer)))
        }
        Err(e) => {
            warn!("Preset rejected: {}", e);
            Err(e.into())
        }
    }
}

/// Handle POST /mode/toggle - Switch between stopwatch and countdown
pub async fn toggle_mode_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.toggle_mode()?;
    let message = format!("Mode set to {}", timer.mode.as_str());
    Ok(Json(ApiResponse::ok(message, timer)))
}

/// Handle GET /status - Return the current timer view
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let timer = state.view()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        uptime: state.get_uptime(),
        last_action,
        last_action_time,
        persistence_error: state.last_persist_error(),
    }))
}

/// Handle GET /presets - List the preset catalog
pub async fn presets_handler(State(state): State<Arc<AppState>>) -> ApiResult<PresetsResponse> {
    let timer = state.view()?;
    Ok(Json(PresetsResponse {
        presets: state.presets.iter().cloned().collect(),
        selected_preset_id: timer.selected_preset_id,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
