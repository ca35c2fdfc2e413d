use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序统一错误类型
/// 用于封装系统中可能出现的各种错误，提供统一的错误处理机制
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AppError {
    /// 输入/输出错误
    #[error("IO错误: {message} (Kind: {kind})")]
    IoError { message: String, kind: String },

    /// 数据持久化相关错误
    #[error("持久化错误: {message}")]
    PersistenceError { message: String },

    /// 配置相关错误
    #[error("配置错误: {message}")]
    ConfigurationError { message: String },

    /// 验证错误（数据验证失败）
    #[error("验证错误: {message}")]
    ValidationError { message: String },

    /// 资源未找到错误
    #[error("资源未找到: {resource_type} - {message}")]
    NotFoundError {
        resource_type: String,
        message: String,
    },

    /// 唯一性冲突（如仿真配置重名、设备地址重复）
    #[error("资源冲突: {message}")]
    ConflictError { message: String },

    /// 业务逻辑错误
    ///
    /// 例如急停状态下启动系统、测试序列重复启动
    #[error("业务逻辑错误: {message}")]
    BusinessLogicError { message: String },

    /// 文件导入错误
    #[error("导入错误: {file_name} - {message}")]
    ImportError { file_name: String, message: String },

    /// JSON序列化/反序列化错误
    #[error("JSON序列化/反序列化错误: {message}")]
    JsonError { message: String },

    /// Excel读写错误
    #[error("Excel处理错误: {message}")]
    ExcelError { message: String },

    /// 模板引擎错误
    #[error("模板引擎错误: {message}")]
    TemplateError { message: String },

    /// 报告生成错误
    #[error("报告生成错误: {message}")]
    ReportGenerationError { message: String },
}

impl AppError {
    /// 创建IO错误
    pub fn io_error(message: impl Into<String>, kind_str: impl Into<String>) -> Self {
        Self::IoError {
            message: message.into(),
            kind: kind_str.into(),
        }
    }

    /// 创建持久化错误
    pub fn persistence_error(message: impl Into<String>) -> Self {
        Self::PersistenceError {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// 创建验证错误
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found_error(resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            resource_type: resource_type.into(),
            message: message.into(),
        }
    }

    /// 创建资源冲突错误
    pub fn conflict_error(message: impl Into<String>) -> Self {
        Self::ConflictError {
            message: message.into(),
        }
    }

    /// 创建业务逻辑错误
    pub fn business_logic_error(message: impl Into<String>) -> Self {
        Self::BusinessLogicError {
            message: message.into(),
        }
    }

    /// 创建文件导入错误
    pub fn import_error(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImportError {
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    /// 创建JSON错误
    pub fn json_error(message: impl Into<String>) -> Self {
        Self::JsonError {
            message: message.into(),
        }
    }

    /// 创建Excel错误
    pub fn excel_error(message: impl Into<String>) -> Self {
        Self::ExcelError {
            message: message.into(),
        }
    }

    /// 创建模板引擎错误
    pub fn template_error(message: impl Into<String>) -> Self {
        Self::TemplateError {
            message: message.into(),
        }
    }

    /// 创建报告生成错误
    pub fn report_generation_error(message: impl Into<String>) -> Self {
        Self::ReportGenerationError {
            message: message.into(),
        }
    }

    /// 获取错误的简短描述
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::IoError { .. } => "IO_ERROR",
            AppError::PersistenceError { .. } => "PERSISTENCE_ERROR",
            AppError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::NotFoundError { .. } => "NOT_FOUND_ERROR",
            AppError::ConflictError { .. } => "CONFLICT_ERROR",
            AppError::BusinessLogicError { .. } => "BUSINESS_LOGIC_ERROR",
            AppError::ImportError { .. } => "IMPORT_ERROR",
            AppError::JsonError { .. } => "JSON_ERROR",
            AppError::ExcelError { .. } => "EXCEL_ERROR",
            AppError::TemplateError { .. } => "TEMPLATE_ERROR",
            AppError::ReportGenerationError { .. } => "REPORT_GENERATION_ERROR",
        }
    }
}

/// 标准 I/O 错误到 AppError 的转换
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError { message: err.to_string(), kind: format!("{:?}", err.kind()) }
    }
}

/// serde_json 错误到 AppError 的转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError { message: err.to_string() }
    }
}

/// 应用程序结果类型别名
/// 简化错误处理的类型定义
pub type AppResult<T> = Result<T, AppError>;

/// 是否为唯一索引冲突（设备地址、仿真配置名称）
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
        || err.to_string().contains("UNIQUE constraint failed")
}

/// sea-orm 数据库错误到 AppError 的转换
///
/// 唯一约束冲突单独映射为 ConflictError，其余归为持久化错误
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        if is_unique_violation(&err) {
            return AppError::ConflictError { message: err.to_string() };
        }
        AppError::PersistenceError { message: err.to_string() }
    }
}

/// rust_xlsxwriter 错误到 AppError 的转换
impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::ExcelError { message: format!("Excel error: {}", err) }
    }
}

/// calamine 读取 xlsx 的错误
impl From<calamine::XlsxError> for AppError {
    fn from(err: calamine::XlsxError) -> Self {
        AppError::ExcelError { message: format!("无法解析xlsx文件: {}", err) }
    }
}

/// calamine 自动识别格式（xls/xlsx）时的错误
impl From<calamine::Error> for AppError {
    fn from(err: calamine::Error) -> Self {
        AppError::ExcelError { message: format!("无法解析Excel文件: {}", err) }
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::TemplateError { message: err.to_string() }
    }
}

/// 上传内容的 base64 解码失败视为输入验证错误
impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::ValidationError { message: format!("文件内容不是有效的base64编码: {}", err) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_messages() {
        let not_found = AppError::not_found_error("TestRecord", "ID为 abc 的记录不存在");
        assert_eq!(not_found.error_code(), "NOT_FOUND_ERROR");
        assert!(not_found.to_string().contains("TestRecord"));

        let import = AppError::import_error("数据.xlsx", "缺少序号列");
        assert_eq!(import.error_code(), "IMPORT_ERROR");
        assert!(import.to_string().contains("数据.xlsx"));
    }

    #[test]
    fn test_error_conversion() {
        let json_error: Result<serde_json::Value, serde_json::Error> = serde_json::from_str("{invalid json}");
        match json_error {
            Err(e) => {
                let app_error: AppError = e.into();
                assert_eq!(app_error.error_code(), "JSON_ERROR");
            }
            Ok(_) => panic!("应该产生JSON错误"),
        }
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            AppError::io_error("x", "NotFound"),
            AppError::persistence_error("x"),
            AppError::configuration_error("x"),
            AppError::validation_error("x"),
            AppError::not_found_error("测试记录", "x"),
            AppError::conflict_error("x"),
            AppError::business_logic_error("x"),
            AppError::import_error("a.xlsx", "x"),
            AppError::json_error("x"),
            AppError::excel_error("x"),
            AppError::template_error("x"),
            AppError::report_generation_error("x"),
        ];
        let codes: std::collections::HashSet<&str> = errors.iter().map(AppError::error_code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let db_err = sea_orm::DbErr::Custom("UNIQUE constraint failed: simulation_configs.name".to_string());
        let app_error: AppError = db_err.into();
        assert_eq!(app_error.error_code(), "CONFLICT_ERROR");

        let other: AppError = sea_orm::DbErr::Custom("disk I/O error".to_string()).into();
        assert_eq!(other.error_code(), "PERSISTENCE_ERROR");
    }
}
