// 测试记录实体

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// 测试记录表，每行为一次测量
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "test_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub test_date: DateTime<Utc>,              // 测试时间

    // 测量值
    #[sea_orm(nullable)]
    pub voltage: Option<f64>,                  // 电压 (V)
    #[sea_orm(nullable)]
    pub current: Option<f64>,                  // 电流 (A)
    #[sea_orm(nullable)]
    pub power: Option<f64>,                    // 功率 (W)

    // 设备信息
    #[sea_orm(nullable)]
    pub device_address: Option<i32>,
    #[sea_orm(nullable)]
    pub device_type: Option<String>,

    // 来源
    #[sea_orm(nullable)]
    pub batch_id: Option<String>,
    #[sea_orm(nullable)]
    pub import_id: Option<String>,

    #[sea_orm(nullable)]
    pub test_duration: Option<f64>,            // 测试时长（秒）
    #[sea_orm(nullable)]
    pub test_result: Option<String>,           // 合格 / 不合格
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    // 审计字段
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub created_by: Option<String>,
    #[sea_orm(nullable)]
    pub updated_by: Option<String>,
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

impl From<&crate::models::structs::TestRecord> for ActiveModel {
    fn from(record: &crate::models::structs::TestRecord) -> Self {
        Self {
            id: Set(record.id.clone()),
            test_date: Set(record.test_date),
            voltage: Set(record.voltage),
            current: Set(record.current),
            power: Set(record.power),
            device_address: Set(record.device_address),
            device_type: Set(record.device_type.clone()),
            batch_id: Set(record.batch_id.clone()),
            import_id: Set(record.import_id.clone()),
            test_duration: Set(record.test_duration),
            test_result: Set(record.test_result.clone()),
            notes: Set(record.notes.clone()),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
            created_by: Set(record.created_by.clone()),
            updated_by: Set(record.updated_by.clone()),
        }
    }
}

impl From<&Model> for crate::models::structs::TestRecord {
    fn from(model: &Model) -> Self {
        crate::models::structs::TestRecord {
            id: model.id.clone(),
            test_date: model.test_date,
            voltage: model.voltage,
            current: model.current,
            power: model.power,
            device_address: model.device_address,
            device_type: model.device_type.clone(),
            batch_id: model.batch_id.clone(),
            import_id: model.import_id.clone(),
            test_duration: model.test_duration,
            test_result: model.test_result.clone(),
            notes: model.notes.clone(),
            created_at: model.created_at,
            updated_at: model.updated_at,
            created_by: model.created_by.clone(),
            updated_by: model.updated_by.clone(),
        }
    }
}
