// 使用SeaORM和SQLite实现数据持久化服务

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Schema, TransactionTrait,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::entities::{
    alert, analysis_result, device, import_batch, simulation_config, system_config, test_record,
};
use crate::models::structs::*;
use crate::services::traits::{BaseService, ImportSink, PersistenceService};
use crate::utils::error::{is_unique_violation, AppError, AppResult};
use super::query::{alert_select, page_offset, record_select};

// 默认的SQLite数据库文件名
const DEFAULT_DB_FILE: &str = "pv_test_data.sqlite";
// 数据库URL前缀
const SQLITE_URL_PREFIX: &str = "sqlite://";
// 内存数据库URL
const SQLITE_MEMORY_URL: &str = "sqlite::memory:";
// 批量插入每批行数
const INSERT_CHUNK_SIZE: usize = 500;

/// 唯一索引冲突转为带业务说明的 ConflictError
fn conflict_or_persistence(err: sea_orm::DbErr, message: impl FnOnce() -> String) -> AppError {
    if is_unique_violation(&err) {
        AppError::conflict_error(message())
    } else {
        err.into()
    }
}

/// 基于SeaORM和SQLite的持久化服务实现
pub struct SqliteOrmPersistenceService {
    db_conn: Arc<DatabaseConnection>,
    db_file_path: Option<PathBuf>,
}

impl SqliteOrmPersistenceService {
    /// 创建持久化服务
    ///
    /// `db_path_opt` 为 None 时使用当前目录下的默认文件；
    /// 路径为 `:memory:` 时使用内存数据库
    pub async fn new(db_path_opt: Option<&Path>) -> AppResult<Self> {
        if db_path_opt.map(|p| p.as_os_str() == ":memory:").unwrap_or(false) {
            return Self::new_in_memory().await;
        }

        let db_file_path = db_path_opt
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));

        if let Some(parent_dir) = db_file_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                tokio::fs::create_dir_all(parent_dir).await.map_err(|e|
                    AppError::io_error(
                        format!("创建数据库目录失败: {:?}", parent_dir),
                        e.kind().to_string()
                    )
                )?;
            }
        }

        // mode=rwc: 文件不存在时创建
        let db_url = format!("{}{}?mode=rwc", SQLITE_URL_PREFIX, db_file_path.to_string_lossy());
        let conn = Database::connect(&db_url)
            .await
            .map_err(|db_err| AppError::persistence_error(format!("连接数据库失败: {}", db_err)))?;

        Self::setup_schema(&conn).await?;
        log::info!("SQLite数据库已打开: {:?}", db_file_path);

        Ok(Self {
            db_conn: Arc::new(conn),
            db_file_path: Some(db_file_path),
        })
    }

    /// 内存数据库，用于测试和演示
    pub async fn new_in_memory() -> AppResult<Self> {
        let conn = Database::connect(SQLITE_MEMORY_URL)
            .await
            .map_err(|db_err| AppError::persistence_error(format!("连接内存数据库失败: {}", db_err)))?;
        Self::setup_schema(&conn).await?;
        Ok(Self {
            db_conn: Arc::new(conn),
            db_file_path: None,
        })
    }

    /// 数据库文件路径，内存数据库为 None
    pub fn db_file_path(&self) -> Option<&Path> {
        self.db_file_path.as_deref()
    }

    /// 底层连接，供测试和维护工具使用
    pub fn connection(&self) -> &DatabaseConnection {
        self.db_conn.as_ref()
    }

    /// 初始化数据库表结构，表已存在时跳过
    async fn setup_schema(db: &DatabaseConnection) -> AppResult<()> {
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);

        let statements = [
            ("test_records", schema.create_table_from_entity(test_record::Entity).if_not_exists().to_owned()),
            ("import_batches", schema.create_table_from_entity(import_batch::Entity).if_not_exists().to_owned()),
            ("devices", schema.create_table_from_entity(device::Entity).if_not_exists().to_owned()),
            ("simulation_configs", schema.create_table_from_entity(simulation_config::Entity).if_not_exists().to_owned()),
            ("alerts", schema.create_table_from_entity(alert::Entity).if_not_exists().to_owned()),
            ("system_configs", schema.create_table_from_entity(system_config::Entity).if_not_exists().to_owned()),
            ("analysis_results", schema.create_table_from_entity(analysis_result::Entity).if_not_exists().to_owned()),
        ];

        for (table, stmt) in statements.iter() {
            db.execute(backend.build(stmt))
                .await
                .map_err(|e| AppError::persistence_error(format!("创建 {} 表失败: {}", table, e)))?;
        }

        log::info!("数据库表结构设置完成或已存在。");
        Ok(())
    }

    fn not_found(resource: &str, id: &str) -> AppError {
        AppError::not_found_error(resource, format!("未找到ID为 {} 的记录", id))
    }
}

#[async_trait]
impl BaseService for SqliteOrmPersistenceService {
    fn service_name(&self) -> &'static str {
        "SqliteOrmPersistenceService"
    }

    async fn initialize(&mut self) -> AppResult<()> {
        // 连接和建表已在 new 中完成
        log::info!("{} 已初始化。", self.service_name());
        Ok(())
    }

    async fn shutdown(&mut self) -> AppResult<()> {
        log::info!("{} 已关闭。", self.service_name());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        self.db_conn.ping().await.map_err(|db_err| {
            AppError::persistence_error(format!("数据库健康检查失败: {}", db_err))
        })?;
        log::debug!("数据库连接健康。");
        Ok(())
    }
}

#[async_trait]
impl PersistenceService for SqliteOrmPersistenceService {
    // --- TestRecord ---
    async fn insert_test_record(&self, record: &TestRecord) -> AppResult<()> {
        let active_model: test_record::ActiveModel = record.into();
        active_model.insert(self.db_conn.as_ref()).await?;
        Ok(())
    }

    async fn insert_test_records(&self, records: &[TestRecord]) -> AppResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let txn = self.db_conn.begin().await?;
        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let models: Vec<test_record::ActiveModel> = chunk.iter().map(|r| r.into()).collect();
            test_record::Entity::insert_many(models).exec(&txn).await?;
        }
        txn.commit().await?;

        log::debug!("批量写入测试记录 {} 条", records.len());
        Ok(records.len() as u64)
    }

    async fn load_test_record(&self, id: &str) -> AppResult<Option<TestRecord>> {
        let model = test_record::Entity::find_by_id(id.to_string())
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn update_test_record(&self, record: &TestRecord) -> AppResult<()> {
        let exists = test_record::Entity::find_by_id(record.id.clone())
            .one(self.db_conn.as_ref())
            .await?
            .is_some();
        if !exists {
            return Err(Self::not_found("TestRecord", &record.id));
        }
        let active_model: test_record::ActiveModel = record.into();
        active_model.update(self.db_conn.as_ref()).await?;
        Ok(())
    }

    async fn delete_test_record(&self, id: &str) -> AppResult<()> {
        let delete_result = test_record::Entity::delete_by_id(id.to_string())
            .exec(self.db_conn.as_ref())
            .await?;
        if delete_result.rows_affected == 0 {
            Err(Self::not_found("TestRecord", id))
        } else {
            Ok(())
        }
    }

    async fn delete_test_records(&self, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let delete_result = test_record::Entity::delete_many()
            .filter(test_record::Column::Id.is_in(ids.iter().cloned()))
            .exec(self.db_conn.as_ref())
            .await?;
        Ok(delete_result.rows_affected)
    }

    async fn query_test_records(&self, query: &RecordQuery) -> AppResult<Page<TestRecord>> {
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);
        let select = record_select(query);

        let total_count = select.clone().count(self.db_conn.as_ref()).await?;
        let models = select
            .offset(page_offset(page, page_size))
            .limit(page_size)
            .all(self.db_conn.as_ref())
            .await?;

        let items = models.iter().map(|m| m.into()).collect();
        Ok(Page::new(items, total_count, page, page_size))
    }

    async fn load_test_records(&self, query: &RecordQuery) -> AppResult<Vec<TestRecord>> {
        let models = record_select(query).all(self.db_conn.as_ref()).await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn load_records_since(&self, since: DateTime<Utc>) -> AppResult<Vec<TestRecord>> {
        let models = test_record::Entity::find()
            .filter(test_record::Column::TestDate.gte(since))
            .order_by_desc(test_record::Column::TestDate)
            .all(self.db_conn.as_ref())
            .await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn load_latest_records(&self, limit: u64) -> AppResult<Vec<TestRecord>> {
        let models = test_record::Entity::find()
            .order_by_desc(test_record::Column::TestDate)
            .limit(limit)
            .all(self.db_conn.as_ref())
            .await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    // --- ImportBatch ---
    async fn save_import_batch(&self, batch: &ImportBatch) -> AppResult<()> {
        let exists = import_batch::Entity::find_by_id(batch.id.clone())
            .one(self.db_conn.as_ref())
            .await?
            .is_some();
        let active_model: import_batch::ActiveModel = batch.into();
        if exists {
            active_model.update(self.db_conn.as_ref()).await?;
        } else {
            active_model.insert(self.db_conn.as_ref()).await?;
        }
        Ok(())
    }

    async fn load_import_batch(&self, id: &str) -> AppResult<Option<ImportBatch>> {
        let model = import_batch::Entity::find_by_id(id.to_string())
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_all_import_batches(&self) -> AppResult<Vec<ImportBatch>> {
        let models = import_batch::Entity::find()
            .order_by_desc(import_batch::Column::ImportDate)
            .all(self.db_conn.as_ref())
            .await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn delete_import_batch(&self, id: &str) -> AppResult<()> {
        let delete_result = import_batch::Entity::delete_by_id(id.to_string())
            .exec(self.db_conn.as_ref())
            .await?;
        if delete_result.rows_affected == 0 {
            Err(Self::not_found("ImportBatch", id))
        } else {
            Ok(())
        }
    }

    // --- Device ---
    async fn save_device(&self, device_info: &Device) -> AppResult<()> {
        let exists = device::Entity::find_by_id(device_info.id.clone())
            .one(self.db_conn.as_ref())
            .await?
            .is_some();
        let active_model: device::ActiveModel = device_info.into();
        let written = if exists {
            active_model.update(self.db_conn.as_ref()).await.map(|_| ())
        } else {
            active_model.insert(self.db_conn.as_ref()).await.map(|_| ())
        };
        // 地址唯一性由唯一索引保证，并发创建同样落到这里
        written.map_err(|err| {
            conflict_or_persistence(err, || format!("设备地址 {} 已被其他设备使用", device_info.device_address))
        })
    }

    async fn load_device(&self, id: &str) -> AppResult<Option<Device>> {
        let model = device::Entity::find_by_id(id.to_string())
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_device_by_address(&self, address: i32) -> AppResult<Option<Device>> {
        let model = device::Entity::find()
            .filter(device::Column::DeviceAddress.eq(address))
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_all_devices(&self) -> AppResult<Vec<Device>> {
        let models = device::Entity::find()
            .order_by_asc(device::Column::DeviceAddress)
            .all(self.db_conn.as_ref())
            .await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn delete_device(&self, id: &str) -> AppResult<()> {
        let delete_result = device::Entity::delete_by_id(id.to_string())
            .exec(self.db_conn.as_ref())
            .await?;
        if delete_result.rows_affected == 0 {
            Err(Self::not_found("Device", id))
        } else {
            Ok(())
        }
    }

    // --- SimulationConfig ---
    async fn save_simulation_config(&self, config: &SimulationConfig) -> AppResult<()> {
        let exists = simulation_config::Entity::find_by_id(config.id.clone())
            .one(self.db_conn.as_ref())
            .await?
            .is_some();
        let active_model: simulation_config::ActiveModel = config.into();
        let written = if exists {
            active_model.update(self.db_conn.as_ref()).await.map(|_| ())
        } else {
            active_model.insert(self.db_conn.as_ref()).await.map(|_| ())
        };
        written.map_err(|err| conflict_or_persistence(err, || format!("仿真配置名称已存在: {}", config.name)))
    }

    async fn load_simulation_config(&self, id: &str) -> AppResult<Option<SimulationConfig>> {
        let model = simulation_config::Entity::find_by_id(id.to_string())
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_all_simulation_configs(&self) -> AppResult<Vec<SimulationConfig>> {
        let models = simulation_config::Entity::find()
            .order_by_desc(simulation_config::Column::UpdatedAt)
            .all(self.db_conn.as_ref())
            .await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn delete_simulation_config(&self, id: &str) -> AppResult<()> {
        let delete_result = simulation_config::Entity::delete_by_id(id.to_string())
            .exec(self.db_conn.as_ref())
            .await?;
        if delete_result.rows_affected == 0 {
            Err(Self::not_found("SimulationConfig", id))
        } else {
            Ok(())
        }
    }

    // --- Alert ---
    async fn save_alert(&self, alert_info: &Alert) -> AppResult<()> {
        let exists = alert::Entity::find_by_id(alert_info.id.clone())
            .one(self.db_conn.as_ref())
            .await?
            .is_some();
        let active_model: alert::ActiveModel = alert_info.into();
        if exists {
            active_model.update(self.db_conn.as_ref()).await?;
        } else {
            active_model.insert(self.db_conn.as_ref()).await?;
        }
        Ok(())
    }

    async fn load_alert(&self, id: &str) -> AppResult<Option<Alert>> {
        let model = alert::Entity::find_by_id(id.to_string())
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_alerts(&self, filter: &AlertFilter) -> AppResult<Vec<Alert>> {
        let models = alert_select(filter).all(self.db_conn.as_ref()).await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    async fn delete_alert(&self, id: &str) -> AppResult<()> {
        let delete_result = alert::Entity::delete_by_id(id.to_string())
            .exec(self.db_conn.as_ref())
            .await?;
        if delete_result.rows_affected == 0 {
            Err(Self::not_found("Alert", id))
        } else {
            Ok(())
        }
    }

    // --- SystemConfig ---
    async fn save_system_config(&self, config: &SystemConfig) -> AppResult<()> {
        let exists = system_config::Entity::find_by_id(config.config_key.clone())
            .one(self.db_conn.as_ref())
            .await?
            .is_some();
        let active_model: system_config::ActiveModel = config.into();
        if exists {
            active_model.update(self.db_conn.as_ref()).await?;
        } else {
            active_model.insert(self.db_conn.as_ref()).await?;
        }
        Ok(())
    }

    async fn load_system_config(&self, key: &str) -> AppResult<Option<SystemConfig>> {
        let model = system_config::Entity::find_by_id(key.to_string())
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_all_system_configs(&self) -> AppResult<Vec<SystemConfig>> {
        let models = system_config::Entity::find()
            .order_by_asc(system_config::Column::ConfigKey)
            .all(self.db_conn.as_ref())
            .await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }

    // --- AnalysisResult ---
    async fn save_analysis_result(&self, result: &AnalysisResult) -> AppResult<()> {
        let active_model: analysis_result::ActiveModel = result.into();
        active_model.insert(self.db_conn.as_ref()).await?;
        Ok(())
    }

    async fn load_analysis_result(&self, id: &str) -> AppResult<Option<AnalysisResult>> {
        let model = analysis_result::Entity::find_by_id(id.to_string())
            .one(self.db_conn.as_ref())
            .await?;
        Ok(model.map(|m| (&m).into()))
    }

    async fn load_all_analysis_results(&self) -> AppResult<Vec<AnalysisResult>> {
        let models = analysis_result::Entity::find()
            .order_by_desc(analysis_result::Column::CreatedAt)
            .all(self.db_conn.as_ref())
            .await?;
        Ok(models.iter().map(|m| m.into()).collect())
    }
}

#[async_trait]
impl ImportSink for SqliteOrmPersistenceService {
    async fn save_batch(&self, batch: &ImportBatch) -> AppResult<()> {
        self.save_import_batch(batch).await
    }

    async fn insert_records(&self, records: &[TestRecord]) -> AppResult<u64> {
        self.insert_test_records(records).await
    }
}
