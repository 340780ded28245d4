//! 统一错误处理
//!
//! 错误响应与成功响应共用同一个信封：
//!
//! ```json
//! { "ok": false, "code": "E1102", "error": "Sold out: EV-1" }
//! ```
//!
//! # 错误码规范
//!
//! | 错误码 | 状态码 | 说明 |
//! |--------|--------|------|
//! | E3001 | 401 | 管理员 PIN 缺失或错误 |
//! | E0002 | 400 | 校验失败 |
//! | E0006 | 400 | 无效请求 (JSON 格式错误) |
//! | E1001 / E1002 | 404 | 活动 / 问答不存在 |
//! | E1101..E1104 | 409 | 预订与答题冲突 |
//! | E9001 / E9002 | 500 | 内部错误 / 数据库错误 |

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use shared::error::DomainError;
use shared::response::AppDataEnvelope;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 (4xx) ==========
    #[error("Invalid admin PIN")]
    /// PIN 错误 (401)
    Unauthorized,

    // ========== 业务逻辑错误 (4xx) ==========
    #[error(transparent)]
    /// 文档操作被拒绝 (400 / 404 / 409)
    Rejected(#[from] DomainError),

    #[error("Invalid request: {0}")]
    /// 无效请求 (400)
    Invalid(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "E3001"),
            AppError::Rejected(e) => {
                let status = if e.is_conflict() {
                    StatusCode::CONFLICT
                } else if e.is_not_found() {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::BAD_REQUEST
                };
                (status, e.code())
            }
            AppError::Invalid(_) => (StatusCode::BAD_REQUEST, "E0006"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E9002"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E9001"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(AppDataEnvelope::failure(code, message))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Invalid(e.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
