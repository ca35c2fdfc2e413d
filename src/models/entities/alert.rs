// 告警实体

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::{json_to_text, text_to_json};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(nullable)]
    pub rule_id: Option<String>,
    pub alert_time: DateTime<Utc>,
    #[sea_orm(column_type = "Text")]
    pub severity: String,                      // low / medium / high / critical
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub data: Option<String>,                  // 触发数据（JSON）
    pub acknowledged: bool,
    #[sea_orm(nullable)]
    pub acknowledged_by: Option<String>,
    #[sea_orm(nullable)]
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved: bool,
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&crate::models::structs::Alert> for ActiveModel {
    fn from(alert: &crate::models::structs::Alert) -> Self {
        Self {
            id: Set(alert.id.clone()),
            rule_id: Set(alert.rule_id.clone()),
            alert_time: Set(alert.alert_time),
            severity: Set(alert.severity.to_string()),
            message: Set(alert.message.clone()),
            data: Set(json_to_text(&alert.data)),
            acknowledged: Set(alert.acknowledged),
            acknowledged_by: Set(alert.acknowledged_by.clone()),
            acknowledged_at: Set(alert.acknowledged_at),
            resolved: Set(alert.resolved),
            resolved_at: Set(alert.resolved_at),
            created_at: Set(alert.created_at),
        }
    }
}

impl From<&Model> for crate::models::structs::Alert {
    fn from(model: &Model) -> Self {
        crate::models::structs::Alert {
            id: model.id.clone(),
            rule_id: model.rule_id.clone(),
            alert_time: model.alert_time,
            severity: model.severity.parse().unwrap_or_default(),
            message: model.message.clone(),
            data: text_to_json(&model.data),
            acknowledged: model.acknowledged,
            acknowledged_by: model.acknowledged_by.clone(),
            acknowledged_at: model.acknowledged_at,
            resolved: model.resolved,
            resolved_at: model.resolved_at,
            created_at: model.created_at,
        }
    }
}
