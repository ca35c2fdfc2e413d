use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::log_user_operation;
use crate::models::structs::SystemConfig;
use crate::web::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct UpsertSettingRequest {
    pub config_value: serde_json::Value,
    pub description: Option<String>,
}

async fn list_settings_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SystemConfig>>> {
    Ok(Json(app_state.persistence.load_all_system_configs().await?))
}

async fn get_setting_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<SystemConfig>> {
    let config = app_state
        .persistence
        .load_system_config(&key)
        .await?
        .ok_or_else(|| AppError::not_found_error("系统配置", &key))?;
    Ok(Json(config))
}

async fn upsert_setting_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(payload): Json<UpsertSettingRequest>,
) -> ApiResult<Json<SystemConfig>> {
    if key.trim().is_empty() {
        return Err(AppError::validation_error("配置键不能为空").into());
    }
    let description = match payload.description {
        Some(d) => Some(d),
        None => app_state.persistence.load_system_config(&key).await?.and_then(|c| c.description),
    };
    let config = SystemConfig {
        config_key: key,
        config_value: payload.config_value,
        description,
        updated_at: Utc::now(),
    };
    app_state.persistence.save_system_config(&config).await?;
    log_user_operation!("更新系统配置: {}", config.config_key);
    Ok(Json(config))
}

pub fn create_settings_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_settings_handler))
        .route("/{key}", get(get_setting_handler).put(upsert_setting_handler))
}
