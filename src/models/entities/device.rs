// 设备实体

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

/// 被测设备表，设备地址唯一
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub device_address: i32,
    #[sea_orm(nullable)]
    pub device_name: Option<String>,
    #[sea_orm(nullable)]
    pub device_type: Option<String>,
    #[sea_orm(nullable)]
    pub manufacturer: Option<String>,
    #[sea_orm(column_name = "model", nullable)]
    pub device_model: Option<String>,
    #[sea_orm(nullable)]
    pub serial_number: Option<String>,
    #[sea_orm(nullable)]
    pub calibration_date: Option<NaiveDate>,
    #[sea_orm(nullable)]
    pub next_calibration_date: Option<NaiveDate>,
    #[sea_orm(column_type = "Text")]
    pub status: String,                        // active / inactive / maintenance
    #[sea_orm(nullable)]
    pub location: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
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

impl From<&crate::models::structs::Device> for ActiveModel {
    fn from(device: &crate::models::structs::Device) -> Self {
        Self {
            id: Set(device.id.clone()),
            device_address: Set(device.device_address),
            device_name: Set(device.device_name.clone()),
            device_type: Set(device.device_type.clone()),
            manufacturer: Set(device.manufacturer.clone()),
            device_model: Set(device.model.clone()),
            serial_number: Set(device.serial_number.clone()),
            calibration_date: Set(device.calibration_date),
            next_calibration_date: Set(device.next_calibration_date),
            status: Set(device.status.to_string()),
            location: Set(device.location.clone()),
            notes: Set(device.notes.clone()),
            created_at: Set(device.created_at),
            updated_at: Set(device.updated_at),
        }
    }
}

impl From<&Model> for crate::models::structs::Device {
    fn from(model: &Model) -> Self {
        crate::models::structs::Device {
            id: model.id.clone(),
            device_address: model.device_address,
            device_name: model.device_name.clone(),
            device_type: model.device_type.clone(),
            manufacturer: model.manufacturer.clone(),
            model: model.device_model.clone(),
            serial_number: model.serial_number.clone(),
            calibration_date: model.calibration_date,
            next_calibration_date: model.next_calibration_date,
            status: model.status.parse().unwrap_or_default(),
            location: model.location.clone(),
            notes: model.notes.clone(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
