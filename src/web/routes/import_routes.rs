use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::structs::ImportBatch;
use crate::services::application::{ImportResult, QueuedFile};
use crate::web::{ApiResult, AppState};

/// 上传请求，文件内容为 base64
#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    pub file_name: String,
    pub content_base64: String,
}

async fn list_files_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<QueuedFile>> {
    Json(app_state.import_service.list_files().await)
}

async fn upload_file_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<UploadFileRequest>,
) -> ApiResult<(StatusCode, Json<QueuedFile>)> {
    let bytes = STANDARD.decode(payload.content_base64.trim()).map_err(AppError::from)?;
    let queued = app_state.import_service.add_file(&payload.file_name, bytes).await?;
    Ok((StatusCode::CREATED, Json(queued)))
}

async fn remove_file_handler(
    State(app_state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    app_state.import_service.remove_file(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn import_file_handler(
    State(app_state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<ImportResult>> {
    Ok(Json(app_state.import_service.import_file(&name).await?))
}

async fn import_all_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<ImportResult>> {
    Json(app_state.import_service.import_all_pending().await)
}

async fn list_batches_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ImportBatch>>> {
    Ok(Json(app_state.persistence.load_all_import_batches().await?))
}

async fn get_batch_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImportBatch>> {
    let batch = app_state
        .persistence
        .load_import_batch(&id)
        .await?
        .ok_or_else(|| AppError::not_found_error("导入批次", &id))?;
    Ok(Json(batch))
}

async fn delete_batch_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    app_state.persistence.delete_import_batch(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `max_upload_bytes` 为请求体上限，base64 编码后约为原文件的 4/3
pub fn create_import_router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/files", get(list_files_handler).post(upload_file_handler))
        .route("/files/{name}", delete(remove_file_handler))
        .route("/files/{name}/import", post(import_file_handler))
        .route("/run", post(import_all_handler))
        .route("/batches", get(list_batches_handler))
        .route("/batches/{id}", get(get_batch_handler).delete(delete_batch_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
