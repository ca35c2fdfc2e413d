//! # 日志记录模块 (Logging Module)
//!
//! 基于 `log` 门面记录系统运行信息，服务进程使用 [`SimpleLogger`] 同时输出到
//! 控制台和日志文件；测试与工具程序使用 env_logger。
//!
//! 业务日志统一使用下面的分类宏，消息以 `[类别]` 开头便于检索。

pub mod simple_logger;

pub use simple_logger::{init_logging, SimpleLogger};

/// 记录文件解析失败日志
#[macro_export]
macro_rules! log_file_parsing_failure {
    ($msg:expr) => {
        log::error!("[文件解析失败] {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::error!("[文件解析失败] {}", format!($msg, $($arg)*));
    };
}

/// 记录数据导入过程日志
#[macro_export]
macro_rules! log_import_event {
    ($msg:expr) => {
        log::info!("[数据导入] {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::info!("[数据导入] {}", format!($msg, $($arg)*));
    };
}

/// 记录用户操作日志
#[macro_export]
macro_rules! log_user_operation {
    ($msg:expr) => {
        log::info!("[用户操作] {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::info!("[用户操作] {}", format!($msg, $($arg)*));
    };
}

/// 记录模拟/控制面板事件
#[macro_export]
macro_rules! log_simulation_event {
    ($msg:expr) => {
        log::info!("[模拟控制] {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::info!("[模拟控制] {}", format!($msg, $($arg)*));
    };
}

/// 记录配置警告
#[macro_export]
macro_rules! log_config_warning {
    ($msg:expr) => {
        log::warn!("[配置警告] {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        log::warn!("[配置警告] {}", format!($msg, $($arg)*));
    };
}

// 重新导出宏
pub use log_file_parsing_failure;
pub use log_import_event;
pub use log_user_operation;
pub use log_simulation_event;
pub use log_config_warning;
