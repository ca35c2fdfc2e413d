/// 应用层服务模块
///
/// 应用层负责协调领域服务和基础设施服务，实现完整的业务流程

/// 数据导入服务 - 文件队列和批量导入
pub mod data_import_service;
/// 报告生成服务 - 统计分析和报告导出
pub mod report_generation_service;
/// 告警服务
pub mod alert_service;

// 重新导出主要的服务
pub use data_import_service::{DataImportService, ImportResult, QueuedFile};
pub use report_generation_service::{
    IReportGenerationService, OverallStatistics, ReportContent, ReportGenerationService, ReportRequest,
};
pub use alert_service::{AlertService, AlertSummary, NewAlert};
