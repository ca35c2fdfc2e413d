use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pv_lib::models::structs::TestRecord;
use pv_lib::services::infrastructure::excel::ExcelExporter;
use pv_lib::services::infrastructure::SqliteOrmPersistenceService;
use pv_lib::utils::config::AppConfig;
use pv_lib::web::{create_axum_router, AppState};

async fn router_with(config: AppConfig) -> Router {
    let persistence = SqliteOrmPersistenceService::new_in_memory().await.expect("内存数据库");
    let state = AppState::new(config, Arc::new(persistence)).expect("初始化状态");
    create_axum_router(Arc::new(state))
}

async fn test_router() -> Router {
    router_with(AppConfig::default()).await
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let router = test_router().await;
    let (status, body) = send(&router, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn record_crud_and_paging() {
    let router = test_router().await;

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/records",
        Some(json!({ "voltage": 20.5, "current": 1.2, "power": 24.6, "device_address": 2, "device_type": "逆变器" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().expect("应返回ID").to_string();

    let (status, page) = send(&router, Method::GET, "/api/records?page=1&page_size=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["items"][0]["id"], id.as_str());

    let (status, updated) =
        send(&router, Method::PUT, &format!("/api/records/{}", id), Some(json!({ "voltage": 21.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["voltage"], 21.0);
    assert_eq!(updated["device_type"], "逆变器");

    let (status, _) = send(&router, Method::DELETE, &format!("/api/records/{}", id), None).await;
    assert!(status.is_success());

    let (status, body) = send(&router, Method::GET, &format!("/api/records/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "NOT_FOUND_ERROR");
}

#[tokio::test]
async fn oversized_page_is_rejected() {
    let router = test_router().await;
    let (status, body) = send(&router, Method::GET, "/api/records?page_size=5000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn emergency_stop_blocks_system_start_until_reset() {
    let router = test_router().await;

    let (status, state) = send(&router, Method::POST, "/api/control/emergency-stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["emergency_stop"], true);

    let (status, body) = send(&router, Method::POST, "/api/control/system", Some(json!({ "active": true }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "BUSINESS_LOGIC_ERROR");

    send(&router, Method::POST, "/api/control/reset", None).await;
    let (status, state) = send(&router, Method::POST, "/api/control/system", Some(json!({ "active": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["system_active"], true);
}

#[tokio::test]
async fn waveform_endpoint_validates_and_generates() {
    let router = test_router().await;

    let (status, samples) = send(
        &router,
        Method::POST,
        "/api/simulation/waveform",
        Some(json!({ "waveform_type": "square", "points": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let values: Vec<f64> = samples.as_array().unwrap().iter().map(|s| s["value"].as_f64().unwrap()).collect();
    assert_eq!(values, vec![5.0, 5.0, -5.0, 5.0]);

    let (status, _) =
        send(&router, Method::POST, "/api/simulation/waveform", Some(json!({ "frequency": 50.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploaded_file_is_imported_and_listed() {
    let router = test_router().await;

    let mut record = TestRecord::new(chrono::Utc::now());
    record.voltage = Some(19.8);
    record.device_address = Some(1);
    let bytes = ExcelExporter::records_to_xlsx(&[record], "上传测试").unwrap();

    let (status, queued) = send(
        &router,
        Method::POST,
        "/api/import/files",
        Some(json!({ "file_name": "上传.xlsx", "content_base64": STANDARD.encode(&bytes) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(queued["status"], "pending");

    let (status, results) = send(&router, Method::POST, "/api/import/run", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results[0]["imported"], 1);

    let (_, page) = send(&router, Method::GET, "/api/records", None).await;
    assert_eq!(page["total_count"], 1);

    let (_, batches) = send(&router, Method::GET, "/api/import/batches", None).await;
    assert_eq!(batches.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_extension_returns_bad_request() {
    let router = test_router().await;
    let (status, _) = send(
        &router,
        Method::POST,
        "/api/import/files",
        Some(json!({ "file_name": "notes.txt", "content_base64": STANDARD.encode(b"hello") })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn alerts_can_be_created_and_acknowledged() {
    let router = test_router().await;

    let (status, alert) = send(
        &router,
        Method::POST,
        "/api/alerts",
        Some(json!({ "severity": "high", "message": "电压偏高" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = alert["id"].as_str().unwrap().to_string();

    let (_, summary) = send(&router, Method::GET, "/api/alerts/summary", None).await;
    assert_eq!(summary["unacknowledged"], 1);

    let (status, acked) = send(
        &router,
        Method::POST,
        &format!("/api/alerts/{}/acknowledge", id),
        Some(json!({ "acknowledged_by": "tester" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked["acknowledged"], true);

    let (_, dashboard) = send(&router, Method::GET, "/api/dashboard", None).await;
    assert_eq!(dashboard["recent_alerts"], 0);
}

#[tokio::test]
async fn listing_uses_configured_page_size() {
    let mut config = AppConfig::default();
    config.import_config.page_size = 5;
    let router = router_with(config).await;

    let inputs: Vec<Value> = (0..7).map(|i| json!({ "voltage": 19.0 + i as f64 })).collect();
    let (status, body) = send(&router, Method::POST, "/api/records/bulk", Some(Value::Array(inputs))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 7);

    let (_, page) = send(&router, Method::GET, "/api/records", None).await;
    assert_eq!(page["page_size"], 5);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 5);

    let (_, page) = send(&router, Method::GET, "/api/records?page_size=10", None).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 7, "显式分页大小优先");
}

#[tokio::test]
async fn large_workbook_upload_is_accepted() {
    let router = test_router().await;
    // 3MB 原始内容，base64 后约 4MB，超过 axum 默认的 2MB 请求体上限
    let content = vec![0x5a_u8; 3 * 1024 * 1024];
    let (status, queued) = send(
        &router,
        Method::POST,
        "/api/import/files",
        Some(json!({ "file_name": "大文件.xlsx", "content_base64": STANDARD.encode(&content) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(queued["size"], 3 * 1024 * 1024);
}

#[tokio::test]
async fn upload_above_configured_limit_is_rejected() {
    let mut config = AppConfig::default();
    config.import_config.max_upload_bytes = 1024;
    let router = router_with(config).await;
    let content = vec![0x5a_u8; 4096];
    let (status, _) = send(
        &router,
        Method::POST,
        "/api/import/files",
        Some(json!({ "file_name": "超限.xlsx", "content_base64": STANDARD.encode(&content) })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn simulation_config_update_requires_name() {
    let router = test_router().await;
    let (status, created) = send(
        &router,
        Method::POST,
        "/api/simulation/configs",
        Some(json!({ "name": "方波测试", "waveform_type": "square" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/simulation/configs/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&router, Method::PUT, &uri, Some(json!({ "name": "  ", "waveform_type": "square" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");

    let (status, updated) =
        send(&router, Method::PUT, &uri, Some(json!({ "name": "方波测试2", "waveform_type": "pwm" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "方波测试2");
}
