use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::log_user_operation;
use crate::models::enums::DeviceStatus;
use crate::models::structs::Device;
use crate::web::{ApiResult, AppState};

/// 新增/修改设备请求
#[derive(Debug, Deserialize)]
pub struct DeviceRequest {
    pub device_address: i32,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub calibration_date: Option<NaiveDate>,
    pub next_calibration_date: Option<NaiveDate>,
    pub status: Option<DeviceStatus>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl DeviceRequest {
    fn apply_to(self, device: &mut Device) {
        device.device_address = self.device_address;
        device.device_name = self.device_name;
        device.device_type = self.device_type;
        device.manufacturer = self.manufacturer;
        device.model = self.model;
        device.serial_number = self.serial_number;
        device.calibration_date = self.calibration_date;
        device.next_calibration_date = self.next_calibration_date;
        if let Some(status) = self.status {
            device.status = status;
        }
        device.location = self.location;
        device.notes = self.notes;
        device.updated_at = Utc::now();
    }
}

async fn list_devices_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Device>>> {
    Ok(Json(app_state.persistence.load_all_devices().await?))
}

async fn create_device_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<DeviceRequest>,
) -> ApiResult<(StatusCode, Json<Device>)> {
    let mut device = Device::new(payload.device_address);
    payload.apply_to(&mut device);
    app_state.persistence.save_device(&device).await?;
    log_user_operation!("新增设备: 地址 {}", device.device_address);
    Ok((StatusCode::CREATED, Json(device)))
}

async fn get_device_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Device>> {
    let device = app_state
        .persistence
        .load_device(&id)
        .await?
        .ok_or_else(|| AppError::not_found_error("设备", &id))?;
    Ok(Json(device))
}

async fn update_device_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<DeviceRequest>,
) -> ApiResult<Json<Device>> {
    let mut device = app_state
        .persistence
        .load_device(&id)
        .await?
        .ok_or_else(|| AppError::not_found_error("设备", &id))?;
    payload.apply_to(&mut device);
    app_state.persistence.save_device(&device).await?;
    log_user_operation!("修改设备: {}", id);
    Ok(Json(device))
}

async fn delete_device_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    app_state.persistence.delete_device(&id).await?;
    log_user_operation!("删除设备: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_devices_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_devices_handler).post(create_device_handler))
        .route(
            "/{id}",
            get(get_device_handler).put(update_device_handler).delete(delete_device_handler),
        )
}
