use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;

use crate::error::AppError;

/// HTTP层错误，包装业务错误并映射状态码
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFoundError { .. } => StatusCode::NOT_FOUND,
            AppError::ValidationError { .. }
            | AppError::ExcelError { .. }
            | AppError::ImportError { .. }
            | AppError::JsonError { .. } => StatusCode::BAD_REQUEST,
            AppError::ConflictError { .. } => StatusCode::CONFLICT,
            AppError::BusinessLogicError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("请求处理失败: {}", self.0);
        }
        let body = serde_json::json!({
            "success": false,
            "error_code": self.0.error_code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(AppError::not_found_error("测试记录", "x")).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError(AppError::validation_error("bad")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(AppError::conflict_error("dup")).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError(AppError::persistence_error("db")).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
