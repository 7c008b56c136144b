use crate::error::VerificationError;
use crate::models::OrderResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// 核销方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// 一次性验证码
    Code,
    /// 下单用户的登录密码
    Password,
    /// 下单用户的身份证号 + 姓名
    IdCard,
    /// 核销人自己的密码（管理员直接核销）
    Direct,
}

impl VerificationMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(VerificationMethod::Code),
            "password" => Some(VerificationMethod::Password),
            "id_card" => Some(VerificationMethod::IdCard),
            "direct" => Some(VerificationMethod::Direct),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::Code => "code",
            VerificationMethod::Password => "password",
            VerificationMethod::IdCard => "id_card",
            VerificationMethod::Direct => "direct",
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            VerificationMethod::Code => &["code"],
            VerificationMethod::Password => &["password"],
            VerificationMethod::IdCard => &["id_number", "name"],
            VerificationMethod::Direct => &["admin_password"],
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            VerificationMethod::Code => "订单已通过验证码核销",
            VerificationMethod::Password => "订单已通过密码核销",
            VerificationMethod::IdCard => "订单已通过身份证核销",
            VerificationMethod::Direct => "订单已由管理员直接核销",
        }
    }

    /// 校验失败提示。多字段校验（身份证号 + 姓名）不区分具体哪一项不匹配。
    pub fn mismatch_message(&self) -> &'static str {
        match self {
            VerificationMethod::Code => "验证码不存在或已过期",
            VerificationMethod::Password => "密码错误",
            VerificationMethod::IdCard => "身份信息不匹配",
            VerificationMethod::Direct => "管理员密码错误",
        }
    }
}

impl std::fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /orders/{id}/verify` 请求体
///
/// 缺失的字段按空值处理，由 `into_proof` 统一给出核销错误。
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyOrderRequest {
    #[schema(example = "code")]
    pub method: String,
    #[schema(example = "482913")]
    pub code: Option<String>,
    pub password: Option<String>,
    pub id_number: Option<String>,
    pub name: Option<String>,
    pub admin_password: Option<String>,
}

/// 已校验的核销凭据，每种方式只携带自己需要的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationProof {
    Code { code: String },
    Password { password: String },
    IdCard { id_number: String, name: String },
    Direct { admin_password: String },
}

impl VerificationProof {
    pub fn method(&self) -> VerificationMethod {
        match self {
            VerificationProof::Code { .. } => VerificationMethod::Code,
            VerificationProof::Password { .. } => VerificationMethod::Password,
            VerificationProof::IdCard { .. } => VerificationMethod::IdCard,
            VerificationProof::Direct { .. } => VerificationMethod::Direct,
        }
    }
}

const CODE_LENGTH: usize = 6;

impl VerifyOrderRequest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "code" => self.code.as_deref(),
            "password" => self.password.as_deref(),
            "id_number" => self.id_number.as_deref(),
            "name" => self.name.as_deref(),
            "admin_password" => self.admin_password.as_deref(),
            _ => None,
        }
    }

    /// 解析核销方式并检查该方式所需字段。方式必须与标签完全一致。
    pub fn into_proof(self) -> Result<VerificationProof, VerificationError> {
        let method =
            VerificationMethod::parse(&self.method).ok_or(VerificationError::InvalidMethod)?;

        let mut errors = BTreeMap::new();
        for &field in method.required_fields() {
            if self.field(field).is_none_or(|v| v.trim().is_empty()) {
                errors.insert(field, format!("{field} 不能为空"));
            }
        }
        if method == VerificationMethod::Code
            && let Some(code) = self.code.as_deref()
            && !code.trim().is_empty()
            && code.chars().count() != CODE_LENGTH
        {
            errors.insert("code", format!("验证码必须为{CODE_LENGTH}位"));
        }
        if !errors.is_empty() {
            return Err(VerificationError::ValidationFailed(errors));
        }

        Ok(match method {
            VerificationMethod::Code => VerificationProof::Code {
                code: self.code.unwrap_or_default(),
            },
            VerificationMethod::Password => VerificationProof::Password {
                password: self.password.unwrap_or_default(),
            },
            VerificationMethod::IdCard => VerificationProof::IdCard {
                id_number: self.id_number.unwrap_or_default(),
                name: self.name.unwrap_or_default(),
            },
            VerificationMethod::Direct => VerificationProof::Direct {
                admin_password: self.admin_password.unwrap_or_default(),
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOrderResponse {
    pub method: VerificationMethod,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueCodeResponse {
    pub order_no: String,
    #[schema(example = "482913")]
    pub code: String,
    /// 有效期（秒）
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CodeStatusResponse {
    pub exists: bool,
}
