/// 基础设施层服务模块
/// 负责与外部资源的交互：SQLite数据持久化、Excel/CSV文件读写

/// 数据持久化相关模块
pub mod persistence;

/// Excel导入导出模块
pub mod excel;

// 重新导出常用接口和实现
pub use persistence::*;
pub use excel::*;
