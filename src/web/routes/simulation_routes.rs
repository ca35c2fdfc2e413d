use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::log_simulation_event;
use crate::models::enums::WaveformType;
use crate::models::structs::{default_id, SimulationConfig};
use crate::services::domain::{generate_waveform, waveform_to_csv, WaveformParams, WaveformReading, WaveformSample};
use crate::utils::time_utils::format_bj;
use crate::web::routes::{download_response, CSV_CONTENT_TYPE};
use crate::web::{ApiResult, AppState};

/// 光标状态
#[derive(Debug, Serialize)]
pub struct CursorResponse {
    pub index: usize,
    pub points: usize,
    pub reading: Option<WaveformReading>,
}

/// 保存仿真配置请求
#[derive(Debug, Deserialize)]
pub struct SimulationConfigRequest {
    pub name: String,
    #[serde(flatten)]
    pub params: WaveformParams,
}

impl SimulationConfigRequest {
    fn validate(&self) -> AppResult<()> {
        self.params.validate()?;
        if self.name.trim().is_empty() {
            return Err(AppError::validation_error("配置名称不能为空"));
        }
        Ok(())
    }

    fn apply_to(self, config: &mut SimulationConfig) {
        config.name = self.name;
        config.waveform_type = self.params.waveform_type;
        config.frequency = self.params.frequency;
        config.amplitude = self.params.amplitude;
        config.phase = self.params.phase;
        config.duty_cycle = self.params.duty_cycle;
        config.parameters = Some(serde_json::json!({ "points": self.params.points }));
        config.updated_at = Utc::now();
    }
}

async fn waveform_handler(Json(params): Json<WaveformParams>) -> ApiResult<Json<Vec<WaveformSample>>> {
    params.validate()?;
    Ok(Json(generate_waveform(&params)))
}

async fn waveform_csv_handler(Json(params): Json<WaveformParams>) -> ApiResult<Response> {
    params.validate()?;
    let csv = waveform_to_csv(&generate_waveform(&params));
    let file_name = format!("waveform_{}_{}.csv", params.waveform_type, format_bj(Utc::now(), "%Y%m%d_%H%M%S"));
    Ok(download_response(csv, CSV_CONTENT_TYPE, &file_name))
}

async fn cursor_response(app_state: &AppState) -> CursorResponse {
    let cursor = app_state.waveform_cursor.lock().await;
    CursorResponse { index: cursor.index(), points: cursor.samples().len(), reading: cursor.current_reading() }
}

async fn get_cursor_handler(State(app_state): State<Arc<AppState>>) -> Json<CursorResponse> {
    Json(cursor_response(&app_state).await)
}

async fn advance_cursor_handler(State(app_state): State<Arc<AppState>>) -> Json<CursorResponse> {
    app_state.waveform_cursor.lock().await.advance();
    Json(cursor_response(&app_state).await)
}

/// 更换播放参数，光标归零
async fn reset_cursor_handler(
    State(app_state): State<Arc<AppState>>,
    Json(params): Json<WaveformParams>,
) -> ApiResult<Json<CursorResponse>> {
    params.validate()?;
    app_state.waveform_cursor.lock().await.reset(&params);
    log_simulation_event!("波形播放参数更新: {} {}Hz", params.waveform_type, params.frequency);
    Ok(Json(cursor_response(&app_state).await))
}

async fn list_configs_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SimulationConfig>>> {
    Ok(Json(app_state.persistence.load_all_simulation_configs().await?))
}

async fn create_config_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SimulationConfigRequest>,
) -> ApiResult<(StatusCode, Json<SimulationConfig>)> {
    payload.validate()?;
    let now = Utc::now();
    let mut config = SimulationConfig {
        id: default_id(),
        name: String::new(),
        waveform_type: WaveformType::Sine,
        frequency: 1.0,
        amplitude: 5.0,
        phase: 0.0,
        duty_cycle: 50.0,
        parameters: None,
        created_at: now,
        updated_at: now,
    };
    payload.apply_to(&mut config);
    app_state.persistence.save_simulation_config(&config).await?;
    log_simulation_event!("保存仿真配置: {}", config.name);
    Ok((StatusCode::CREATED, Json(config)))
}

async fn get_config_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SimulationConfig>> {
    let config = app_state
        .persistence
        .load_simulation_config(&id)
        .await?
        .ok_or_else(|| AppError::not_found_error("仿真配置", &id))?;
    Ok(Json(config))
}

async fn update_config_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<SimulationConfigRequest>,
) -> ApiResult<Json<SimulationConfig>> {
    payload.validate()?;
    let mut config = app_state
        .persistence
        .load_simulation_config(&id)
        .await?
        .ok_or_else(|| AppError::not_found_error("仿真配置", &id))?;
    payload.apply_to(&mut config);
    app_state.persistence.save_simulation_config(&config).await?;
    Ok(Json(config))
}

async fn delete_config_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    app_state.persistence.delete_simulation_config(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_simulation_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/waveform", post(waveform_handler))
        .route("/waveform/csv", post(waveform_csv_handler))
        .route("/cursor", get(get_cursor_handler).put(reset_cursor_handler))
        .route("/cursor/advance", post(advance_cursor_handler))
        .route("/configs", get(list_configs_handler).post(create_config_handler))
        .route(
            "/configs/{id}",
            get(get_config_handler).put(update_config_handler).delete(delete_config_handler),
        )
}
