/// 数据导入服务
///
/// 维护上传文件队列，逐个解析Excel并以一个导入批次批量写入测试记录。
/// 文件状态：pending -> processing -> success / error
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::enums::{FileImportStatus, ImportBatchStatus};
use crate::models::structs::{ImportBatch, TestRecord};
use crate::services::infrastructure::excel::{format_file_size, ExcelImporter, ImportedRow};
use crate::services::traits::ImportSink;
use crate::utils::config::ImportConfig;
use crate::{log_import_event, log_user_operation};

/// 队列中的文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedFile {
    pub name: String,
    pub size: u64,
    pub size_display: String,
    pub status: FileImportStatus,
    pub added_at: DateTime<Utc>,
    pub batch_id: Option<String>,
    pub record_count: Option<usize>,
    pub error: Option<String>,
}

/// 单个文件的导入结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub file_name: String,
    pub batch_id: Option<String>,
    pub total_rows: usize,
    pub imported: u64,
    pub status: FileImportStatus,
    pub error: Option<String>,
}

impl ImportResult {
    pub fn is_successful(&self) -> bool {
        self.status == FileImportStatus::Success
    }
}

struct QueueEntry {
    info: QueuedFile,
    bytes: Arc<Vec<u8>>,
}

/// 数据导入服务
pub struct DataImportService {
    sink: Arc<dyn ImportSink>,
    importer: ExcelImporter,
    config: ImportConfig,
    queue: RwLock<Vec<QueueEntry>>,
}

impl DataImportService {
    pub fn new(sink: Arc<dyn ImportSink>, config: ImportConfig) -> Self {
        Self {
            sink,
            importer: ExcelImporter::new(config.skip_rows_after_header),
            config,
            queue: RwLock::new(Vec::new()),
        }
    }

    /// 检查文件扩展名
    pub fn is_allowed_file(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.config
            .allowed_extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext.trim_start_matches('.').to_lowercase())))
    }

    /// 加入队列，只接受 .xlsx / .xls，同名文件不可重复加入
    pub async fn add_file(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<QueuedFile> {
        if !self.is_allowed_file(file_name) {
            return Err(AppError::validation_error(format!(
                "不支持的文件类型: {}，仅支持 {}",
                file_name,
                self.config.allowed_extensions.join(" / ")
            )));
        }

        let mut queue = self.queue.write().await;
        if queue.iter().any(|e| e.info.name == file_name) {
            return Err(AppError::conflict_error(format!("文件已在队列中: {}", file_name)));
        }

        let size = bytes.len() as u64;
        let info = QueuedFile {
            name: file_name.to_string(),
            size,
            size_display: format_file_size(size),
            status: FileImportStatus::Pending,
            added_at: Utc::now(),
            batch_id: None,
            record_count: None,
            error: None,
        };
        queue.push(QueueEntry { info: info.clone(), bytes: Arc::new(bytes) });
        log_user_operation!("添加导入文件: {} ({})", file_name, info.size_display);
        Ok(info)
    }

    /// 从队列移除，处理中的文件不可移除
    pub async fn remove_file(&self, file_name: &str) -> AppResult<()> {
        let mut queue = self.queue.write().await;
        let idx = queue
            .iter()
            .position(|e| e.info.name == file_name)
            .ok_or_else(|| AppError::not_found_error("导入文件", file_name))?;
        if queue[idx].info.status == FileImportStatus::Processing {
            return Err(AppError::business_logic_error(format!("文件正在导入，无法移除: {}", file_name)));
        }
        queue.remove(idx);
        log_user_operation!("移除导入文件: {}", file_name);
        Ok(())
    }

    pub async fn list_files(&self) -> Vec<QueuedFile> {
        self.queue.read().await.iter().map(|e| e.info.clone()).collect()
    }

    /// 导入队列中的一个文件，导入成功的文件不可重复导入
    pub async fn import_file(&self, file_name: &str) -> AppResult<ImportResult> {
        let bytes = {
            let mut queue = self.queue.write().await;
            let entry = queue
                .iter_mut()
                .find(|e| e.info.name == file_name)
                .ok_or_else(|| AppError::not_found_error("导入文件", file_name))?;
            match entry.info.status {
                FileImportStatus::Processing => {
                    return Err(AppError::conflict_error(format!("文件正在导入: {}", file_name)))
                }
                FileImportStatus::Success => {
                    return Err(AppError::conflict_error(format!("文件已导入: {}", file_name)))
                }
                FileImportStatus::Pending | FileImportStatus::Error => {}
            }
            entry.info.status = FileImportStatus::Processing;
            entry.info.error = None;
            Arc::clone(&entry.bytes)
        };

        let result = self.import_bytes(file_name, &bytes).await;

        let mut queue = self.queue.write().await;
        if let Some(entry) = queue.iter_mut().find(|e| e.info.name == file_name) {
            entry.info.status = result.status;
            entry.info.batch_id = result.batch_id.clone();
            entry.info.record_count = Some(result.total_rows);
            entry.info.error = result.error.clone();
        }
        Ok(result)
    }

    /// 依次导入所有待处理文件
    pub async fn import_all_pending(&self) -> Vec<ImportResult> {
        let pending: Vec<String> = self
            .queue
            .read()
            .await
            .iter()
            .filter(|e| e.info.status == FileImportStatus::Pending)
            .map(|e| e.info.name.clone())
            .collect();

        let mut results = Vec::with_capacity(pending.len());
        for name in pending {
            match self.import_file(&name).await {
                Ok(result) => results.push(result),
                Err(e) => warn!("跳过文件 {}: {}", name, e),
            }
        }
        results
    }

    /// 解析并写入一个文件的内容，失败信息记录在结果中
    pub async fn import_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult {
        log_import_event!("开始导入文件: {}", file_name);

        let parsed = match self.importer.parse_bytes(file_name, bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("[数据导入] 文件解析失败 {}: {}", file_name, e);
                return ImportResult {
                    file_name: file_name.to_string(),
                    batch_id: None,
                    total_rows: 0,
                    imported: 0,
                    status: FileImportStatus::Error,
                    error: Some(e.to_string()),
                };
            }
        };

        let total_rows = parsed.rows.len();
        let mut batch = ImportBatch::new(file_name, bytes.len() as i64, total_rows as i32);
        batch.status = ImportBatchStatus::Processing;
        let failed = |batch_id: Option<String>, e: &AppError| ImportResult {
            file_name: file_name.to_string(),
            batch_id,
            total_rows,
            imported: 0,
            status: FileImportStatus::Error,
            error: Some(e.to_string()),
        };

        if let Err(e) = self.sink.save_batch(&batch).await {
            error!("[数据导入] 创建导入批次失败 {}: {}", file_name, e);
            return failed(None, &e);
        }

        match self.write_records(&mut batch, &parsed.rows).await {
            Ok(imported) => {
                log_import_event!("文件 {} 导入完成: {} 条记录, 批次 {}", file_name, imported, batch.id);
                ImportResult {
                    file_name: file_name.to_string(),
                    batch_id: Some(batch.id),
                    total_rows,
                    imported,
                    status: FileImportStatus::Success,
                    error: None,
                }
            }
            Err(e) => {
                error!("[数据导入] 文件 {} 导入失败: {}", file_name, e);
                batch.status = ImportBatchStatus::Failed;
                batch.error_count = total_rows as i32;
                batch.error_details = Some(serde_json::json!({
                    "error_code": e.error_code(),
                    "message": e.to_string(),
                }));
                if let Err(update_err) = self.sink.save_batch(&batch).await {
                    error!("[数据导入] 更新批次 {} 失败状态时出错: {}", batch.id, update_err);
                }
                failed(Some(batch.id.clone()), &e)
            }
        }
    }

    /// 批量写入记录后将批次置为完成
    async fn write_records(&self, batch: &mut ImportBatch, rows: &[ImportedRow]) -> AppResult<u64> {
        let now = Utc::now();
        let records: Vec<TestRecord> = rows.iter().map(|row| self.map_row(row, &batch.id, now)).collect();
        let imported = self.sink.insert_records(&records).await?;

        batch.status = ImportBatchStatus::Completed;
        batch.success_count = imported as i32;
        self.sink.save_batch(batch).await?;
        Ok(imported)
    }

    /// 行到记录的映射，缺失值使用默认值
    fn map_row(&self, row: &ImportedRow, batch_id: &str, now: DateTime<Utc>) -> TestRecord {
        let mut record = TestRecord::new(row.timestamp.unwrap_or(now));
        record.current = Some(row.current.unwrap_or(0.0));
        record.voltage = Some(row.voltage.unwrap_or(0.0));
        record.power = Some(row.power.unwrap_or(0.0));
        record.device_address = Some(row.device_address.unwrap_or(0));
        record.device_type = Some(
            row.device_type
                .clone()
                .unwrap_or_else(|| self.config.default_device_type.clone()),
        );
        record.import_id = Some(batch_id.to_string());
        record.batch_id = Some(batch_id.to_string());
        record.test_result = Some(self.config.default_test_result.clone());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::traits::MockImportSink;
    use std::sync::Mutex;

    /// 按样例数据格式生成工作簿：表头、数据信息行、空行、数据行（数值为文本）
    fn sample_workbook(rows: usize) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let headers = ["序号", "电流 (A)", "电压 (V)", "功率 (W)", "时间戳", "设备地址", "设备类型"];
        for (col, h) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *h).unwrap();
        }
        sheet.write_string(1, 0, "数据信息").unwrap();
        sheet.write_string(1, 1, "记录时间: 2025/5/2 14:22:56 | 设备地址: 1").unwrap();
        for i in 0..rows {
            let r = (i + 3) as u32;
            sheet.write_number(r, 0, (i + 1) as f64).unwrap();
            sheet.write_string(r, 1, "1.23456").unwrap();
            sheet.write_string(r, 2, "19.50000").unwrap();
            sheet.write_string(r, 3, "24.00000").unwrap();
            sheet.write_string(r, 4, format!("2025/5/2 14:22:{}", 10 + i)).unwrap();
            sheet.write_number(r, 5, 1.0).unwrap();
            if i % 2 == 0 {
                sheet.write_string(r, 6, "光伏关断器").unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    fn service_with(sink: MockImportSink) -> DataImportService {
        DataImportService::new(Arc::new(sink), ImportConfig::default())
    }

    #[tokio::test]
    async fn test_import_success_creates_and_completes_batch() {
        let saved: Arc<Mutex<Vec<ImportBatch>>> = Arc::new(Mutex::new(Vec::new()));
        let inserted: Arc<Mutex<Vec<TestRecord>>> = Arc::new(Mutex::new(Vec::new()));

        let mut sink = MockImportSink::new();
        let saved_clone = Arc::clone(&saved);
        sink.expect_save_batch().times(2).returning(move |batch| {
            saved_clone.lock().unwrap().push(batch.clone());
            Ok(())
        });
        let inserted_clone = Arc::clone(&inserted);
        sink.expect_insert_records().times(1).returning(move |records| {
            inserted_clone.lock().unwrap().extend_from_slice(records);
            Ok(records.len() as u64)
        });

        let service = service_with(sink);
        service.add_file("实验数据.xlsx", sample_workbook(4)).await.unwrap();
        let result = service.import_file("实验数据.xlsx").await.unwrap();

        assert!(result.is_successful());
        assert_eq!(result.total_rows, 4);
        assert_eq!(result.imported, 4);

        let saved = saved.lock().unwrap();
        assert_eq!(saved[0].status, ImportBatchStatus::Processing);
        assert_eq!(saved[0].record_count, 4);
        assert_eq!(saved[1].status, ImportBatchStatus::Completed);
        assert_eq!(saved[1].success_count, 4);

        let records = inserted.lock().unwrap();
        let batch_id = result.batch_id.clone().unwrap();
        assert!(records.iter().all(|r| r.batch_id.as_deref() == Some(batch_id.as_str())));
        assert!(records.iter().all(|r| r.import_id.as_deref() == Some(batch_id.as_str())));
        assert_eq!(records[0].voltage, Some(19.5));
        assert_eq!(records[0].device_type.as_deref(), Some("光伏关断器"));
        assert_eq!(records[1].device_type.as_deref(), Some("未知"), "缺失的设备类型使用默认值");
        assert_eq!(records[0].test_result.as_deref(), Some("合格"));

        let files = service.list_files().await;
        assert_eq!(files[0].status, FileImportStatus::Success);
        assert_eq!(files[0].record_count, Some(4));
    }

    #[tokio::test]
    async fn test_insert_failure_marks_file_error_and_batch_failed() {
        let saved: Arc<Mutex<Vec<ImportBatch>>> = Arc::new(Mutex::new(Vec::new()));
        let mut sink = MockImportSink::new();
        let saved_clone = Arc::clone(&saved);
        sink.expect_save_batch().times(2).returning(move |batch| {
            saved_clone.lock().unwrap().push(batch.clone());
            Ok(())
        });
        sink.expect_insert_records()
            .times(1)
            .returning(|_| Err(AppError::persistence_error("磁盘已满")));

        let service = service_with(sink);
        service.add_file("电压测试记录.xlsx", sample_workbook(3)).await.unwrap();
        let result = service.import_file("电压测试记录.xlsx").await.unwrap();

        assert_eq!(result.status, FileImportStatus::Error);
        assert!(result.error.unwrap().contains("磁盘已满"));
        let saved = saved.lock().unwrap();
        assert_eq!(saved[1].status, ImportBatchStatus::Failed);
        assert!(saved[1].error_details.is_some());
        assert_eq!(service.list_files().await[0].status, FileImportStatus::Error);
    }

    #[tokio::test]
    async fn test_unparseable_file_creates_no_batch() {
        let mut sink = MockImportSink::new();
        sink.expect_save_batch().never();
        sink.expect_insert_records().never();

        let service = service_with(sink);
        service.add_file("损坏.xlsx", b"garbage".to_vec()).await.unwrap();
        let result = service.import_file("损坏.xlsx").await.unwrap();
        assert_eq!(result.status, FileImportStatus::Error);
        assert!(result.batch_id.is_none());
    }

    #[tokio::test]
    async fn test_queue_rules() {
        let service = service_with(MockImportSink::new());
        let err = service.add_file("报告.pdf", vec![1, 2, 3]).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let queued = service.add_file("功率分析报告.XLSX", vec![0; 2048]).await.unwrap();
        assert_eq!(queued.status, FileImportStatus::Pending);
        assert_eq!(queued.size_display, "2.0 KB");
        assert_eq!(
            service.add_file("功率分析报告.XLSX", vec![]).await.unwrap_err().error_code(),
            "CONFLICT_ERROR"
        );

        service.remove_file("功率分析报告.XLSX").await.unwrap();
        assert!(service.list_files().await.is_empty());
        assert_eq!(service.remove_file("不存在.xlsx").await.unwrap_err().error_code(), "NOT_FOUND_ERROR");
    }
}
