use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::structs::{DailyStatistics, RecordQuery};
use crate::services::domain::{daily_statistics, dashboard_stats, DashboardStats, LiveMetric};
use crate::web::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

async fn stats_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<DashboardStats>> {
    let records = app_state.persistence.load_test_records(&RecordQuery::default()).await?;
    let alerts = app_state.alert_service.unacknowledged_count().await?;
    Ok(Json(dashboard_stats(&records, alerts, Utc::now())))
}

async fn daily_handler(
    State(app_state): State<Arc<AppState>>,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Json<Vec<DailyStatistics>>> {
    let query = RecordQuery { date_from: range.date_from, date_to: range.date_to, ..Default::default() };
    let records = app_state.persistence.load_test_records(&query).await?;
    Ok(Json(daily_statistics(&records)))
}

/// 最近的实时指标点
async fn live_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<LiveMetric>> {
    Json(app_state.metric_ticker.snapshot().await)
}

pub fn create_dashboard_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(stats_handler))
        .route("/daily", get(daily_handler))
        .route("/live", get(live_handler))
}
