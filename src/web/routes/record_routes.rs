use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::log_user_operation;
use crate::models::structs::{Page, RecordQuery, TestRecord, TestRecordInput};
use crate::services::infrastructure::excel::{csv_file_name, records_to_csv, xlsx_file_name, ExcelExporter};
use crate::utils::time_utils::{format_bj, DISPLAY_FORMAT};
use crate::web::routes::{download_response, CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE};
use crate::web::{ApiError, ApiResult, AppState};

const MAX_PAGE_SIZE: u64 = 1000;

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

fn validate_query(query: &RecordQuery) -> Result<(), ApiError> {
    if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
        return Err(AppError::validation_error(format!("每页条数需在1-{}之间", MAX_PAGE_SIZE)).into());
    }
    Ok(())
}

/// 请求中显式给出的分页大小
#[derive(Debug, Default, Deserialize)]
pub struct PageSizeParam {
    pub page_size: Option<u64>,
}

async fn list_records_handler(
    State(app_state): State<Arc<AppState>>,
    Query(size): Query<PageSizeParam>,
    Query(mut query): Query<RecordQuery>,
) -> ApiResult<Json<Page<TestRecord>>> {
    query.page_size = size.page_size.unwrap_or(app_state.config.import_config.page_size);
    validate_query(&query)?;
    Ok(Json(app_state.persistence.query_test_records(&query).await?))
}

async fn create_record_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<TestRecordInput>,
) -> ApiResult<(StatusCode, Json<TestRecord>)> {
    let record = payload.into_record();
    app_state.persistence.insert_test_record(&record).await?;
    log_user_operation!("新增测试记录: {}", record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

async fn bulk_create_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<Vec<TestRecordInput>>,
) -> ApiResult<(StatusCode, Json<CountResponse>)> {
    let records: Vec<TestRecord> = payload.into_iter().map(TestRecordInput::into_record).collect();
    let count = app_state.persistence.insert_test_records(&records).await?;
    log_user_operation!("批量新增测试记录: {} 条", count);
    Ok((StatusCode::CREATED, Json(CountResponse { count })))
}

async fn get_record_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TestRecord>> {
    let record = app_state
        .persistence
        .load_test_record(&id)
        .await?
        .ok_or_else(|| AppError::not_found_error("测试记录", &id))?;
    Ok(Json(record))
}

async fn update_record_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<TestRecordInput>,
) -> ApiResult<Json<TestRecord>> {
    let mut record = app_state
        .persistence
        .load_test_record(&id)
        .await?
        .ok_or_else(|| AppError::not_found_error("测试记录", &id))?;
    payload.apply_to(&mut record);
    app_state.persistence.update_test_record(&record).await?;
    log_user_operation!("修改测试记录: {}", id);
    Ok(Json(record))
}

async fn delete_record_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    app_state.persistence.delete_test_record(&id).await?;
    log_user_operation!("删除测试记录: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn batch_delete_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<BatchDeleteRequest>,
) -> ApiResult<Json<CountResponse>> {
    if payload.ids.is_empty() {
        return Err(AppError::validation_error("请选择要删除的记录").into());
    }
    let count = app_state.persistence.delete_test_records(&payload.ids).await?;
    log_user_operation!("批量删除测试记录: {} 条", count);
    Ok(Json(CountResponse { count }))
}

async fn export_csv_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<Response> {
    let records = app_state.persistence.load_test_records(&query).await?;
    log_user_operation!("导出CSV: {} 条记录", records.len());
    Ok(download_response(records_to_csv(&records), CSV_CONTENT_TYPE, &csv_file_name(Utc::now())))
}

async fn export_xlsx_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<Response> {
    let now = Utc::now();
    let records = app_state.persistence.load_test_records(&query).await?;
    let info = format!("导出时间: {} | 数据点数: {}", format_bj(now, DISPLAY_FORMAT), records.len());
    let bytes = ExcelExporter::records_to_xlsx(&records, &info)?;
    log_user_operation!("导出XLSX: {} 条记录", records.len());
    Ok(download_response(bytes, XLSX_CONTENT_TYPE, &xlsx_file_name(now)))
}

pub fn create_records_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_records_handler).post(create_record_handler))
        .route("/bulk", post(bulk_create_handler))
        .route("/batch-delete", post(batch_delete_handler))
        .route("/export/csv", get(export_csv_handler))
        .route("/export/xlsx", get(export_xlsx_handler))
        .route(
            "/{id}",
            get(get_record_handler).put(update_record_handler).delete(delete_record_handler),
        )
}
