/// 服务层基础trait定义
/// 提供各层服务的接口规范，支持依赖注入和测试

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::utils::error::AppResult;
use crate::models::structs::*;

/// 基础服务trait，所有服务都应实现
#[async_trait]
pub trait BaseService: Send + Sync {
    /// 服务名称
    fn service_name(&self) -> &'static str;

    /// 初始化服务
    async fn initialize(&mut self) -> AppResult<()>;

    /// 关闭服务
    async fn shutdown(&mut self) -> AppResult<()>;

    /// 健康检查
    async fn health_check(&self) -> AppResult<()>;
}

/// 数据持久化服务trait
///
/// 覆盖过滤、分页计数、单条/批量插入、按ID更新、按ID或ID集合删除
#[async_trait]
pub trait PersistenceService: BaseService {
    // ---------- 测试记录 ----------

    /// 插入单条测试记录
    async fn insert_test_record(&self, record: &TestRecord) -> AppResult<()>;

    /// 批量插入测试记录（单个事务），返回插入条数
    async fn insert_test_records(&self, records: &[TestRecord]) -> AppResult<u64>;

    /// 按ID加载测试记录
    async fn load_test_record(&self, id: &str) -> AppResult<Option<TestRecord>>;

    /// 按ID更新测试记录，记录不存在时返回 NotFound
    async fn update_test_record(&self, record: &TestRecord) -> AppResult<()>;

    /// 按ID删除测试记录
    async fn delete_test_record(&self, id: &str) -> AppResult<()>;

    /// 按ID集合删除测试记录，返回删除条数
    async fn delete_test_records(&self, ids: &[String]) -> AppResult<u64>;

    /// 过滤 + 排序 + 分页查询，附带精确总数
    async fn query_test_records(&self, query: &RecordQuery) -> AppResult<Page<TestRecord>>;

    /// 加载满足过滤条件的全部记录（忽略分页，用于导出和统计）
    async fn load_test_records(&self, query: &RecordQuery) -> AppResult<Vec<TestRecord>>;

    /// 加载某时间之后的记录，按测试时间降序
    async fn load_records_since(&self, since: DateTime<Utc>) -> AppResult<Vec<TestRecord>>;

    /// 加载最新的若干条记录
    async fn load_latest_records(&self, limit: u64) -> AppResult<Vec<TestRecord>>;

    // ---------- 导入批次 ----------

    async fn save_import_batch(&self, batch: &ImportBatch) -> AppResult<()>;

    async fn load_import_batch(&self, id: &str) -> AppResult<Option<ImportBatch>>;

    /// 按导入时间降序
    async fn load_all_import_batches(&self) -> AppResult<Vec<ImportBatch>>;

    async fn delete_import_batch(&self, id: &str) -> AppResult<()>;

    // ---------- 设备 ----------

    /// 保存设备，地址与其他设备重复时返回 Conflict
    async fn save_device(&self, device: &Device) -> AppResult<()>;

    async fn load_device(&self, id: &str) -> AppResult<Option<Device>>;

    async fn load_device_by_address(&self, address: i32) -> AppResult<Option<Device>>;

    /// 按设备地址升序
    async fn load_all_devices(&self) -> AppResult<Vec<Device>>;

    async fn delete_device(&self, id: &str) -> AppResult<()>;

    // ---------- 仿真配置 ----------

    /// 保存仿真配置，名称与其他配置重复时返回 Conflict
    async fn save_simulation_config(&self, config: &SimulationConfig) -> AppResult<()>;

    async fn load_simulation_config(&self, id: &str) -> AppResult<Option<SimulationConfig>>;

    async fn load_all_simulation_configs(&self) -> AppResult<Vec<SimulationConfig>>;

    async fn delete_simulation_config(&self, id: &str) -> AppResult<()>;

    // ---------- 告警 ----------

    async fn save_alert(&self, alert: &Alert) -> AppResult<()>;

    async fn load_alert(&self, id: &str) -> AppResult<Option<Alert>>;

    /// 按告警时间降序
    async fn load_alerts(&self, filter: &AlertFilter) -> AppResult<Vec<Alert>>;

    async fn delete_alert(&self, id: &str) -> AppResult<()>;

    // ---------- 系统配置 ----------

    async fn save_system_config(&self, config: &SystemConfig) -> AppResult<()>;

    async fn load_system_config(&self, key: &str) -> AppResult<Option<SystemConfig>>;

    async fn load_all_system_configs(&self) -> AppResult<Vec<SystemConfig>>;

    // ---------- 分析结果 ----------

    async fn save_analysis_result(&self, result: &AnalysisResult) -> AppResult<()>;

    async fn load_analysis_result(&self, id: &str) -> AppResult<Option<AnalysisResult>>;

    /// 按创建时间降序
    async fn load_all_analysis_results(&self) -> AppResult<Vec<AnalysisResult>>;
}

/// 导入流程所需的最小存储接口
///
/// 导入服务只依赖这两个操作，测试中可用 mock 替换
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImportSink: Send + Sync {
    /// 创建或更新导入批次
    async fn save_batch(&self, batch: &ImportBatch) -> AppResult<()>;

    /// 批量写入测试记录，返回写入条数
    async fn insert_records(&self, records: &[TestRecord]) -> AppResult<u64>;
}
