// 统计分析结果实体

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::{json_to_text, text_to_json};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "analysis_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub analysis_type: String,                 // daily / weekly / monthly / custom
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub parameters: Option<String>,            // JSON
    #[sea_orm(column_type = "Text")]
    pub results: String,                       // JSON
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&crate::models::structs::AnalysisResult> for ActiveModel {
    fn from(result: &crate::models::structs::AnalysisResult) -> Self {
        Self {
            id: Set(result.id.clone()),
            analysis_type: Set(result.analysis_type.to_string()),
            start_date: Set(result.start_date),
            end_date: Set(result.end_date),
            parameters: Set(json_to_text(&result.parameters)),
            results: Set(result.results.to_string()),
            summary: Set(result.summary.clone()),
            created_at: Set(result.created_at),
        }
    }
}

impl From<&Model> for crate::models::structs::AnalysisResult {
    fn from(model: &Model) -> Self {
        crate::models::structs::AnalysisResult {
            id: model.id.clone(),
            analysis_type: model.analysis_type.parse().unwrap_or_default(),
            start_date: model.start_date,
            end_date: model.end_date,
            parameters: text_to_json(&model.parameters),
            results: serde_json::from_str(&model.results).unwrap_or(serde_json::Value::Null),
            summary: model.summary.clone(),
            created_at: model.created_at,
        }
    }
}
