//! # 核心数据结构模块
//!
//! 业务层使用的数据结构，与 `entities` 中的数据库模型通过 From 相互转换。
//! 所有结构体都支持 JSON 序列化，直接作为 HTTP 接口的请求/响应体使用。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::enums::{
    AlertSeverity, AnalysisType, DeviceStatus, ImportBatchStatus, WaveformType,
};

/// 测试结果"合格"
pub const PASS_RESULT: &str = "合格";
/// 测试结果"不合格"
pub const FAIL_RESULT: &str = "不合格";

/// 生成默认ID
pub fn default_id() -> String {
    Uuid::new_v4().to_string()
}

/// 测试记录：一次电压/电流/功率测量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(default = "default_id")]
    pub id: String,
    pub test_date: DateTime<Utc>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
    pub device_address: Option<i32>,
    pub device_type: Option<String>,
    pub batch_id: Option<String>,
    pub import_id: Option<String>,
    /// 测试持续时间（秒）
    pub test_duration: Option<f64>,
    pub test_result: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl TestRecord {
    /// 以给定测试时间创建空记录
    pub fn new(test_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: default_id(),
            test_date,
            voltage: None,
            current: None,
            power: None,
            device_address: None,
            device_type: None,
            batch_id: None,
            import_id: None,
            test_duration: None,
            test_result: None,
            notes: None,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.test_result.as_deref() == Some(PASS_RESULT)
    }

    /// 电压、电流、功率均有值且不为0
    pub fn has_complete_measurements(&self) -> bool {
        [self.voltage, self.current, self.power]
            .iter()
            .all(|v| matches!(v, Some(x) if *x != 0.0))
    }
}

/// 新增/修改测试记录的请求体
///
/// 修改时只覆盖提供了值的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestRecordInput {
    pub test_date: Option<DateTime<Utc>>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
    pub device_address: Option<i32>,
    pub device_type: Option<String>,
    pub batch_id: Option<String>,
    pub test_duration: Option<f64>,
    pub test_result: Option<String>,
    pub notes: Option<String>,
    pub operator: Option<String>,
}

impl TestRecordInput {
    pub fn into_record(self) -> TestRecord {
        let mut record = TestRecord::new(self.test_date.unwrap_or_else(Utc::now));
        record.created_by = self.operator.clone();
        self.apply_to(&mut record);
        record
    }

    pub fn apply_to(self, record: &mut TestRecord) {
        if let Some(v) = self.test_date {
            record.test_date = v;
        }
        if self.voltage.is_some() {
            record.voltage = self.voltage;
        }
        if self.current.is_some() {
            record.current = self.current;
        }
        if self.power.is_some() {
            record.power = self.power;
        }
        if self.device_address.is_some() {
            record.device_address = self.device_address;
        }
        if self.device_type.is_some() {
            record.device_type = self.device_type;
        }
        if self.batch_id.is_some() {
            record.batch_id = self.batch_id;
        }
        if self.test_duration.is_some() {
            record.test_duration = self.test_duration;
        }
        if self.test_result.is_some() {
            record.test_result = self.test_result;
        }
        if self.notes.is_some() {
            record.notes = self.notes;
        }
        if self.operator.is_some() {
            record.updated_by = self.operator;
        }
        record.updated_at = Utc::now();
    }
}

/// 导入批次：一次批量上传操作及其结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub id: String,
    pub file_name: String,
    pub file_size: i64,
    pub import_date: DateTime<Utc>,
    pub record_count: i32,
    pub success_count: i32,
    pub error_count: i32,
    pub status: ImportBatchStatus,
    pub error_details: Option<Value>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ImportBatch {
    pub fn new(file_name: impl Into<String>, file_size: i64, record_count: i32) -> Self {
        let now = Utc::now();
        Self {
            id: default_id(),
            file_name: file_name.into(),
            file_size,
            import_date: now,
            record_count,
            success_count: 0,
            error_count: 0,
            status: ImportBatchStatus::Pending,
            error_details: None,
            user_id: None,
            created_at: now,
        }
    }
}

/// 被测设备
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default = "default_id")]
    pub id: String,
    pub device_address: i32,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub calibration_date: Option<NaiveDate>,
    pub next_calibration_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: DeviceStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Device {
    pub fn new(device_address: i32) -> Self {
        let now = Utc::now();
        Self {
            id: default_id(),
            device_address,
            device_name: None,
            device_type: None,
            manufacturer: None,
            model: None,
            serial_number: None,
            calibration_date: None,
            next_calibration_date: None,
            status: DeviceStatus::Active,
            location: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 显示名称，未命名时为"设备 {地址}"
    pub fn display_name(&self) -> String {
        self.device_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("设备 {}", self.device_address))
    }
}

/// 已保存的波形仿真参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_id")]
    pub id: String,
    pub name: String,
    pub waveform_type: WaveformType,
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
    pub duty_cycle: f64,
    pub parameters: Option<Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// 告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rule_id: Option<String>,
    pub alert_time: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub message: String,
    pub data: Option<Value>,
    pub acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(severity: AlertSeverity, message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: default_id(),
            rule_id: None,
            alert_time: now,
            severity,
            message: message.into(),
            data: None,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved: false,
            resolved_at: None,
            created_at: now,
        }
    }
}

/// 系统配置键值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub config_key: String,
    pub config_value: Value,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// 统计分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub analysis_type: AnalysisType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub parameters: Option<Value>,
    pub results: Value,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 按天汇总的测试统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistics {
    pub test_day: NaiveDate,
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub pass_rate: f64,
    pub avg_voltage: Option<f64>,
    pub avg_current: Option<f64>,
    pub avg_power: Option<f64>,
    pub min_power: Option<f64>,
    pub max_power: Option<f64>,
}

/// 测试记录查询条件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordQuery {
    /// 页码，从1开始
    pub page: u64,
    pub page_size: u64,
    /// 模糊搜索：设备类型包含该文本，或设备地址等于其整数值
    pub search: Option<String>,
    pub device_type: Option<String>,
    pub device_address: Option<i32>,
    pub test_result: Option<String>,
    pub batch_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// 按测试时间升序，默认降序
    pub ascending: bool,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            search: None,
            device_type: None,
            device_address: None,
            test_result: None,
            batch_id: None,
            date_from: None,
            date_to: None,
            ascending: false,
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: u64, page_size: u64) -> Self {
        let total_pages = if page_size == 0 { 0 } else { total_count.div_ceil(page_size) };
        Self { items, total_count, page, page_size, total_pages }
    }
}

/// 告警查询条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilter {
    pub severity: Option<AlertSeverity>,
    pub acknowledged: Option<bool>,
    pub resolved: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_total_pages() {
        let page: Page<u8> = Page::new(vec![], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_complete_measurements() {
        let mut record = TestRecord::new(Utc::now());
        record.voltage = Some(20.0);
        record.current = Some(1.2);
        assert!(!record.has_complete_measurements(), "缺少功率时不应计入");
        record.power = Some(0.0);
        assert!(!record.has_complete_measurements(), "功率为0时不应计入");
        record.power = Some(24.0);
        assert!(record.has_complete_measurements());
    }

    #[test]
    fn test_input_only_overrides_provided_fields() {
        let mut record = TestRecord::new(Utc::now());
        record.voltage = Some(19.5);
        record.device_type = Some("逆变器".to_string());

        TestRecordInput {
            power: Some(30.0),
            test_result: Some(FAIL_RESULT.to_string()),
            ..Default::default()
        }
        .apply_to(&mut record);

        assert_eq!(record.voltage, Some(19.5));
        assert_eq!(record.power, Some(30.0));
        assert_eq!(record.device_type.as_deref(), Some("逆变器"));
        assert!(!record.is_passed());
    }

    #[test]
    fn test_device_display_name() {
        let mut device = Device::new(3);
        assert_eq!(device.display_name(), "设备 3");
        device.device_name = Some("1号关断器".to_string());
        assert_eq!(device.display_name(), "1号关断器");
    }
}
