// 系统配置实体（键值）

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub config_key: String,
    #[sea_orm(column_type = "Text")]
    pub config_value: String,                  // JSON
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&crate::models::structs::SystemConfig> for ActiveModel {
    fn from(config: &crate::models::structs::SystemConfig) -> Self {
        Self {
            config_key: Set(config.config_key.clone()),
            config_value: Set(config.config_value.to_string()),
            description: Set(config.description.clone()),
            updated_at: Set(config.updated_at),
        }
    }
}

impl From<&Model> for crate::models::structs::SystemConfig {
    fn from(model: &Model) -> Self {
        crate::models::structs::SystemConfig {
            config_key: model.config_key.clone(),
            config_value: serde_json::from_str(&model.config_value)
                .unwrap_or(serde_json::Value::Null),
            description: model.description.clone(),
            updated_at: model.updated_at,
        }
    }
}
