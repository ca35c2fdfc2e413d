// 波形仿真配置实体

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::{json_to_text, text_to_json};

/// 仿真配置表，名称唯一
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "simulation_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub waveform_type: String,                 // sine / square / triangle / pwm
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
    pub duty_cycle: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub parameters: Option<String>,            // 扩展参数（JSON）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        self.updated_at = Set(Utc::now());
        Ok(self)
    }
}

impl From<&crate::models::structs::SimulationConfig> for ActiveModel {
    fn from(config: &crate::models::structs::SimulationConfig) -> Self {
        Self {
            id: Set(config.id.clone()),
            name: Set(config.name.clone()),
            waveform_type: Set(config.waveform_type.to_string()),
            frequency: Set(config.frequency),
            amplitude: Set(config.amplitude),
            phase: Set(config.phase),
            duty_cycle: Set(config.duty_cycle),
            parameters: Set(json_to_text(&config.parameters)),
            created_at: Set(config.created_at),
            updated_at: Set(config.updated_at),
        }
    }
}

impl From<&Model> for crate::models::structs::SimulationConfig {
    fn from(model: &Model) -> Self {
        crate::models::structs::SimulationConfig {
            id: model.id.clone(),
            name: model.name.clone(),
            waveform_type: model.waveform_type.parse().unwrap_or_default(),
            frequency: model.frequency,
            amplitude: model.amplitude,
            phase: model.phase,
            duty_cycle: model.duty_cycle,
            parameters: text_to_json(&model.parameters),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
