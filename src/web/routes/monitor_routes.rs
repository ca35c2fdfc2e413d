use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::services::domain::MonitorSnapshot;
use crate::web::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

async fn snapshot_handler(State(app_state): State<Arc<AppState>>) -> Json<MonitorSnapshot> {
    Json(app_state.device_monitor.snapshot().await)
}

/// 重新全量加载设备和最新记录
async fn reload_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<MonitorSnapshot>> {
    Ok(Json(app_state.device_monitor.load(app_state.persistence.as_ref()).await?))
}

async fn refresh_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<MonitorSnapshot>> {
    Ok(Json(app_state.device_monitor.refresh(app_state.persistence.as_ref()).await?))
}

async fn toggle_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ToggleRequest>,
) -> Json<MonitorSnapshot> {
    app_state.device_monitor.set_monitoring(payload.enabled);
    Json(app_state.device_monitor.snapshot().await)
}

pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(snapshot_handler))
        .route("/reload", post(reload_handler))
        .route("/refresh", post(refresh_handler))
        .route("/toggle", put(toggle_handler))
}
