//! HTTP 接口层
//!
//! axum 路由按功能拆分在 `routes` 下，所有路由共享 [`AppState`]。

use std::sync::Arc;

use axum::{http::Method, routing::get, Json, Router};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::error::AppResult;
use crate::services::application::{AlertService, DataImportService, ReportGenerationService};
use crate::services::domain::{ControlPanel, DeviceMonitor, MetricTicker, WaveformCursor, WaveformParams};
use crate::services::infrastructure::SqliteOrmPersistenceService;
use crate::services::traits::{ImportSink, PersistenceService};
use crate::utils::config::AppConfig;

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult};

use routes::*;

/// 路由共享状态
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub persistence: Arc<dyn PersistenceService>,
    pub import_service: Arc<DataImportService>,
    pub report_service: Arc<ReportGenerationService>,
    pub alert_service: Arc<AlertService>,
    pub metric_ticker: MetricTicker,
    pub control_panel: ControlPanel,
    pub device_monitor: Arc<DeviceMonitor>,
    pub waveform_cursor: Mutex<WaveformCursor>,
}

impl AppState {
    pub fn new(config: AppConfig, persistence: Arc<SqliteOrmPersistenceService>) -> AppResult<Self> {
        let store: Arc<dyn PersistenceService> = persistence.clone();
        let sink: Arc<dyn ImportSink> = persistence;

        let monitor = &config.monitor_config;
        let simulation = &config.simulation_config;
        let device_monitor = Arc::new(DeviceMonitor::new(
            monitor.online_window_secs,
            monitor.refresh_window_secs,
            monitor.latest_records_limit,
        ));
        let cursor = WaveformCursor::new(&WaveformParams {
            points: simulation.default_points,
            ..Default::default()
        });

        Ok(Self {
            import_service: Arc::new(DataImportService::new(sink, config.import_config.clone())),
            report_service: Arc::new(ReportGenerationService::new(store.clone())?),
            alert_service: Arc::new(AlertService::new(store.clone())),
            metric_ticker: MetricTicker::new(simulation.ticker_history),
            control_panel: ControlPanel::new(),
            device_monitor,
            waveform_cursor: Mutex::new(cursor),
            persistence: store,
            config: Arc::new(config),
        })
    }
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// 组装全部路由
pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let router = Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/ws/live", get(handlers::live_ws_handler::live_ws_handler))
        .nest("/api/records", record_routes::create_records_router())
        .nest(
            "/api/import",
            import_routes::create_import_router(app_state.config.import_config.max_upload_bytes),
        )
        .nest("/api/devices", device_routes::create_devices_router())
        .nest("/api/monitor", monitor_routes::create_monitor_router())
        .nest("/api/control", control_routes::create_control_router())
        .nest("/api/simulation", simulation_routes::create_simulation_router())
        .nest("/api/dashboard", dashboard_routes::create_dashboard_router())
        .nest("/api/alerts", alert_routes::create_alert_router())
        .nest("/api/reports", report_routes::create_reports_router())
        .nest("/api/settings", settings_routes::create_settings_router())
        .with_state(app_state.clone());

    if app_state.config.server_config.cors_allow_any {
        router.layer(cors)
    } else {
        router
    }
}
