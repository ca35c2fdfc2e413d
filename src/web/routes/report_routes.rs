use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Response},
    routing::get,
    Json, Router,
};

use crate::models::structs::AnalysisResult;
use crate::services::application::{IReportGenerationService, ReportRequest};
use crate::utils::time_utils::format_bj;
use crate::web::routes::{download_response, XLSX_CONTENT_TYPE};
use crate::web::{ApiResult, AppState};

async fn list_reports_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<Vec<AnalysisResult>>> {
    Ok(Json(app_state.report_service.list_reports().await?))
}

async fn generate_report_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> ApiResult<(StatusCode, Json<AnalysisResult>)> {
    Ok((StatusCode::CREATED, Json(app_state.report_service.generate(&request).await?)))
}

async fn get_report_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnalysisResult>> {
    Ok(Json(app_state.report_service.get_report(&id).await?))
}

async fn report_xlsx_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let report = app_state.report_service.get_report(&id).await?;
    let bytes = app_state.report_service.render_xlsx(&report)?;
    let file_name = format!(
        "analysis_{}_{}.xlsx",
        report.analysis_type,
        format_bj(report.created_at, "%Y%m%d_%H%M%S")
    );
    Ok(download_response(bytes, XLSX_CONTENT_TYPE, &file_name))
}

async fn report_html_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Html<String>> {
    let report = app_state.report_service.get_report(&id).await?;
    Ok(Html(app_state.report_service.render_html(&report)?))
}

pub fn create_reports_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_reports_handler).post(generate_report_handler))
        .route("/{id}", get(get_report_handler))
        .route("/{id}/xlsx", get(report_xlsx_handler))
        .route("/{id}/html", get(report_html_handler))
}
