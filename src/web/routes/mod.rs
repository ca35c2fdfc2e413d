use axum::{
    http::header,
    response::{IntoResponse, Response},
};

pub mod alert_routes;
pub mod control_routes;
pub mod dashboard_routes;
pub mod device_routes;
pub mod import_routes;
pub mod monitor_routes;
pub mod record_routes;
pub mod report_routes;
pub mod settings_routes;
pub mod simulation_routes;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 文件下载响应
pub fn download_response(body: impl Into<axum::body::Body>, content_type: &str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        body.into(),
    )
        .into_response()
}
