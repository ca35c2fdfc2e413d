use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::models::enums::ControlMode;
use crate::services::domain::{ControlState, SequenceStep, TEST_SEQUENCE};
use crate::web::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SystemRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeviceSwitchRequest {
    pub on: bool,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: ControlMode,
}

async fn state_handler(State(app_state): State<Arc<AppState>>) -> Json<ControlState> {
    Json(app_state.control_panel.state().await)
}

async fn system_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SystemRequest>,
) -> ApiResult<Json<ControlState>> {
    Ok(Json(app_state.control_panel.set_system_active(payload.active).await?))
}

async fn device_handler(
    State(app_state): State<Arc<AppState>>,
    Path(device): Path<usize>,
    Json(payload): Json<DeviceSwitchRequest>,
) -> ApiResult<Json<ControlState>> {
    Ok(Json(app_state.control_panel.set_device(device, payload.on).await?))
}

async fn mode_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ModeRequest>,
) -> Json<ControlState> {
    Json(app_state.control_panel.set_mode(payload.mode).await)
}

async fn emergency_stop_handler(State(app_state): State<Arc<AppState>>) -> Json<ControlState> {
    Json(app_state.control_panel.emergency_stop().await)
}

async fn reset_handler(State(app_state): State<Arc<AppState>>) -> Json<ControlState> {
    Json(app_state.control_panel.reset().await)
}

async fn sequence_steps_handler() -> Json<Vec<SequenceStep>> {
    Json(TEST_SEQUENCE.to_vec())
}

/// 启动序列后立即返回，序列在后台运行
async fn start_sequence_handler(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<ControlState>)> {
    app_state.control_panel.start_test_sequence().await?;
    Ok((StatusCode::ACCEPTED, Json(app_state.control_panel.state().await)))
}

pub fn create_control_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(state_handler))
        .route("/system", post(system_handler))
        .route("/devices/{device}", post(device_handler))
        .route("/mode", post(mode_handler))
        .route("/emergency-stop", post(emergency_stop_handler))
        .route("/reset", post(reset_handler))
        .route("/sequence", get(sequence_steps_handler).post(start_sequence_handler))
}
