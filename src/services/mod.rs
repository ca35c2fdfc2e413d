/// 服务层模块，包含应用层、领域层和基础设施层的服务定义
///
/// - Application Layer: 应用服务，协调业务流程
/// - Domain Layer: 领域服务，仿真、控制、监控和统计
/// - Infrastructure Layer: 基础设施服务，存储和Excel文件处理

/// 应用层服务模块
pub mod application;

/// 领域层服务模块
pub mod domain;

/// 基础设施层服务模块
pub mod infrastructure;

/// 服务层基础trait定义
pub mod traits;

// 重新导出基础trait
pub use traits::{BaseService, ImportSink, PersistenceService};

// 重新导出应用层服务
pub use application::{
    AlertService, DataImportService, IReportGenerationService, ImportResult, ReportGenerationService,
};

// 重新导出领域层服务
pub use domain::{ControlPanel, DeviceMonitor, MetricTicker};

// 重新导出基础设施层的主要类型
pub use infrastructure::{ExcelExporter, ExcelImporter, SqliteOrmPersistenceService};
