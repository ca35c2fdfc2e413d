// 导入批次实体

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::{json_to_text, text_to_json};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "import_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub file_name: String,
    pub file_size: i64,                        // 字节
    pub import_date: DateTime<Utc>,
    pub record_count: i32,
    pub success_count: i32,
    pub error_count: i32,
    #[sea_orm(column_type = "Text")]
    pub status: String,                        // pending / processing / completed / failed
    #[sea_orm(column_type = "Text", nullable)]
    pub error_details: Option<String>,         // 错误详情（JSON）
    #[sea_orm(nullable)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&crate::models::structs::ImportBatch> for ActiveModel {
    fn from(batch: &crate::models::structs::ImportBatch) -> Self {
        Self {
            id: Set(batch.id.clone()),
            file_name: Set(batch.file_name.clone()),
            file_size: Set(batch.file_size),
            import_date: Set(batch.import_date),
            record_count: Set(batch.record_count),
            success_count: Set(batch.success_count),
            error_count: Set(batch.error_count),
            status: Set(batch.status.to_string()),
            error_details: Set(json_to_text(&batch.error_details)),
            user_id: Set(batch.user_id.clone()),
            created_at: Set(batch.created_at),
        }
    }
}

impl From<&Model> for crate::models::structs::ImportBatch {
    fn from(model: &Model) -> Self {
        crate::models::structs::ImportBatch {
            id: model.id.clone(),
            file_name: model.file_name.clone(),
            file_size: model.file_size,
            import_date: model.import_date,
            record_count: model.record_count,
            success_count: model.success_count,
            error_count: model.error_count,
            status: model.status.parse().unwrap_or_default(),
            error_details: text_to_json(&model.error_details),
            user_id: model.user_id.clone(),
            created_at: model.created_at,
        }
    }
}
