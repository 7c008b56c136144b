pub mod auth;
pub mod order;
pub mod point;
pub mod product;

pub use auth::auth_config;
pub use order::{admin_config, order_config};
pub use point::point_config;
pub use product::product_config;

use crate::error::{AppError, VerificationError};
use crate::models::CurrentUser;
use actix_web::error::JsonPayloadError;
use actix_web::{HttpMessage, HttpRequest, web};
use std::collections::BTreeMap;

/// 读取鉴权中间件写入的当前用户
pub(crate) fn current_user(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    req.extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// 全局 JSON 请求体配置：解析失败时返回统一的错误结构而不是纯文本
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        log::warn!("Invalid JSON body: {} {}: {err}", req.method(), req.path());
        AppError::ValidationError("请求体格式错误".to_string()).into()
    })
}

/// 核销接口的 JSON 配置，错误结构与核销失败一致
pub(crate) fn verification_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        log::warn!("Invalid verification body: {}: {err}", req.path());
        let mut errors = BTreeMap::new();
        errors.insert("body", "请求体格式错误".to_string());
        VerificationError::ValidationFailed(errors).into()
    })
}
