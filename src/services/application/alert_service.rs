/// 告警服务
///
/// 告警的创建、确认、解决和汇总
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::log_user_operation;
use crate::models::enums::AlertSeverity;
use crate::models::structs::{Alert, AlertFilter};
use crate::services::traits::PersistenceService;

/// 新建告警请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    #[serde(default)]
    pub severity: AlertSeverity,
    pub message: String,
    pub rule_id: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// 告警汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: u64,
    pub unacknowledged: u64,
    pub acknowledged: u64,
    pub unresolved: u64,
    pub by_severity: BTreeMap<String, u64>,
}

impl AlertSummary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let mut by_severity: BTreeMap<String, u64> =
            AlertSeverity::ALL.iter().map(|s| (s.to_string(), 0)).collect();
        for alert in alerts {
            *by_severity.entry(alert.severity.to_string()).or_default() += 1;
        }
        let acknowledged = alerts.iter().filter(|a| a.acknowledged).count() as u64;
        Self {
            total: alerts.len() as u64,
            unacknowledged: alerts.len() as u64 - acknowledged,
            acknowledged,
            unresolved: alerts.iter().filter(|a| !a.resolved).count() as u64,
            by_severity,
        }
    }
}

pub struct AlertService {
    persistence_service: Arc<dyn PersistenceService>,
}

impl AlertService {
    pub fn new(persistence_service: Arc<dyn PersistenceService>) -> Self {
        Self { persistence_service }
    }

    pub async fn list(&self, filter: &AlertFilter) -> AppResult<Vec<Alert>> {
        self.persistence_service.load_alerts(filter).await
    }

    pub async fn create(&self, request: NewAlert) -> AppResult<Alert> {
        if request.message.trim().is_empty() {
            return Err(AppError::validation_error("告警内容不能为空"));
        }
        let mut alert = Alert::new(request.severity, request.message);
        alert.rule_id = request.rule_id;
        alert.data = request.data;
        self.persistence_service.save_alert(&alert).await?;
        Ok(alert)
    }

    async fn load(&self, id: &str) -> AppResult<Alert> {
        self.persistence_service
            .load_alert(id)
            .await?
            .ok_or_else(|| AppError::not_found_error("告警", id))
    }

    /// 确认告警
    pub async fn acknowledge(&self, id: &str, by: Option<String>) -> AppResult<Alert> {
        let mut alert = self.load(id).await?;
        alert.acknowledged = true;
        alert.acknowledged_by = by;
        alert.acknowledged_at = Some(Utc::now());
        self.persistence_service.save_alert(&alert).await?;
        log_user_operation!("确认告警: {}", id);
        Ok(alert)
    }

    /// 解决告警
    pub async fn resolve(&self, id: &str) -> AppResult<Alert> {
        let mut alert = self.load(id).await?;
        alert.resolved = true;
        alert.resolved_at = Some(Utc::now());
        self.persistence_service.save_alert(&alert).await?;
        log_user_operation!("解决告警: {}", id);
        Ok(alert)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.persistence_service.delete_alert(id).await
    }

    pub async fn summary(&self) -> AppResult<AlertSummary> {
        let alerts = self.persistence_service.load_alerts(&AlertFilter::default()).await?;
        Ok(AlertSummary::from_alerts(&alerts))
    }

    /// 未确认告警数
    pub async fn unacknowledged_count(&self) -> AppResult<u64> {
        let filter = AlertFilter { acknowledged: Some(false), ..Default::default() };
        Ok(self.persistence_service.load_alerts(&filter).await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::infrastructure::SqliteOrmPersistenceService;

    async fn create_service() -> AlertService {
        let persistence = SqliteOrmPersistenceService::new_in_memory().await.unwrap();
        AlertService::new(Arc::new(persistence))
    }

    #[tokio::test]
    async fn test_alert_lifecycle() {
        let service = create_service().await;
        let alert = service
            .create(NewAlert { severity: AlertSeverity::High, message: "电压超限".to_string(), rule_id: None, data: None })
            .await
            .unwrap();
        service
            .create(NewAlert { severity: AlertSeverity::Low, message: "通讯延迟".to_string(), rule_id: None, data: None })
            .await
            .unwrap();
        assert_eq!(service.unacknowledged_count().await.unwrap(), 2);

        let acked = service.acknowledge(&alert.id, Some("李工".to_string())).await.unwrap();
        assert!(acked.acknowledged);
        assert!(acked.acknowledged_at.is_some());
        let resolved = service.resolve(&alert.id).await.unwrap();
        assert!(resolved.resolved);

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.unacknowledged, 1);
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.by_severity["high"], 1);
        assert_eq!(summary.by_severity["critical"], 0);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let service = create_service().await;
        let err = service
            .create(NewAlert { severity: AlertSeverity::Medium, message: "  ".to_string(), rule_id: None, data: None })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(service.acknowledge("missing", None).await.unwrap_err().error_code(), "NOT_FOUND_ERROR");
    }
}
