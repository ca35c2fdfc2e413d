use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::models::structs::{Alert, AlertFilter};
use crate::services::application::{AlertSummary, NewAlert};
use crate::web::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct AcknowledgeRequest {
    pub acknowledged_by: Option<String>,
}

async fn list_alerts_handler(
    State(app_state): State<Arc<AppState>>,
    Query(filter): Query<AlertFilter>,
) -> ApiResult<Json<Vec<Alert>>> {
    Ok(Json(app_state.alert_service.list(&filter).await?))
}

async fn create_alert_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NewAlert>,
) -> ApiResult<(StatusCode, Json<Alert>)> {
    Ok((StatusCode::CREATED, Json(app_state.alert_service.create(payload).await?)))
}

async fn summary_handler(State(app_state): State<Arc<AppState>>) -> ApiResult<Json<AlertSummary>> {
    Ok(Json(app_state.alert_service.summary().await?))
}

async fn acknowledge_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Option<Json<AcknowledgeRequest>>,
) -> ApiResult<Json<Alert>> {
    let by = payload.and_then(|Json(p)| p.acknowledged_by);
    Ok(Json(app_state.alert_service.acknowledge(&id, by).await?))
}

async fn resolve_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Alert>> {
    Ok(Json(app_state.alert_service.resolve(&id).await?))
}

async fn delete_alert_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    app_state.alert_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_alert_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_alerts_handler).post(create_alert_handler))
        .route("/summary", get(summary_handler))
        .route("/{id}", delete(delete_alert_handler))
        .route("/{id}/acknowledge", post(acknowledge_handler))
        .route("/{id}/resolve", post(resolve_handler))
}
