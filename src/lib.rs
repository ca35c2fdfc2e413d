/// 光伏关断器测试数据管理服务 - 核心库
pub mod utils;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod web;

// 重新导出常用类型，方便使用
pub use models::*;
pub use utils::{AppError, AppResult, AppConfig};
pub use web::{create_axum_router, AppState};
