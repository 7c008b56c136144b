use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                ("AUTH_ERROR", msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                ("AUTH_ERROR", "Invalid token".to_string())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                ("FORBIDDEN", "Forbidden".to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("DATABASE_ERROR", "Database error".to_string())
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

/// 订单核销失败原因
///
/// 除 `Internal` 外均为客户端错误，且不会产生任何数据变更。
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("订单不存在")]
    OrderNotFound,

    #[error("订单数据异常：缺少订单号")]
    OrderDataInvalid,

    #[error("订单已核销，请勿重复操作")]
    AlreadyVerified,

    #[error("订单已取消，无法核销")]
    OrderCancelled,

    #[error("订单已完成，无法核销")]
    OrderAlreadyCompleted,

    #[error("订单已失败，无法核销")]
    OrderFailed,

    #[error("无效的核销方式")]
    InvalidMethod,

    #[error("参数验证失败")]
    ValidationFailed(BTreeMap<&'static str, String>),

    #[error("{0}")]
    VerificationMismatch(&'static str),

    #[error("核销失败，请稍后重试")]
    Internal(String),
}

impl VerificationError {
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::OrderNotFound => "ORDER_NOT_FOUND",
            VerificationError::OrderDataInvalid => "ORDER_DATA_INVALID",
            VerificationError::AlreadyVerified => "ALREADY_VERIFIED",
            VerificationError::OrderCancelled => "ORDER_CANCELLED",
            VerificationError::OrderAlreadyCompleted => "ORDER_ALREADY_COMPLETED",
            VerificationError::OrderFailed => "ORDER_FAILED",
            VerificationError::InvalidMethod => "INVALID_METHOD",
            VerificationError::ValidationFailed(_) => "VALIDATION_FAILED",
            VerificationError::VerificationMismatch(_) => "VERIFICATION_MISMATCH",
            VerificationError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DbErr> for VerificationError {
    fn from(err: DbErr) -> Self {
        VerificationError::Internal(err.to_string())
    }
}

impl From<AppError> for VerificationError {
    fn from(err: AppError) -> Self {
        VerificationError::Internal(err.to_string())
    }
}

impl ResponseError for VerificationError {
    fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::OrderNotFound => StatusCode::NOT_FOUND,
            VerificationError::AlreadyVerified
            | VerificationError::OrderCancelled
            | VerificationError::OrderAlreadyCompleted
            | VerificationError::OrderFailed
            | VerificationError::VerificationMismatch(_) => StatusCode::BAD_REQUEST,
            VerificationError::InvalidMethod | VerificationError::ValidationFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            VerificationError::OrderDataInvalid | VerificationError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal 的细节只写日志，响应中只给通用提示
        let mut body = json!({
            "success": false,
            "code": self.code(),
            "message": self.to_string(),
        });
        if let VerificationError::ValidationFailed(errors) = self {
            body["errors"] = json!(errors);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
