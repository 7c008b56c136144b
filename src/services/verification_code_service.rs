use crate::utils::generate_six_digit_code;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CodeEntry {
    code: String,
    expires_at: DateTime<Utc>,
}

impl CodeEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// 订单核销验证码（按订单号存放，进程内缓存，带过期时间）
///
/// 过期判断在读取时进行；`purge_expired` 只负责回收内存。
#[derive(Clone)]
pub struct VerificationCodeService {
    codes: Arc<RwLock<HashMap<String, CodeEntry>>>,
    ttl: Duration,
}

impl VerificationCodeService {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            codes: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// 生成新验证码，覆盖旧验证码并重置有效期
    pub async fn issue(&self, order_no: &str) -> String {
        let code = generate_six_digit_code();
        let entry = CodeEntry {
            code: code.clone(),
            expires_at: Utc::now() + self.ttl,
        };
        self.codes.write().await.insert(order_no.to_string(), entry);
        code
    }

    pub async fn exists(&self, order_no: &str) -> bool {
        let now = Utc::now();
        self.codes
            .read()
            .await
            .get(order_no)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// 校验验证码，不会消费验证码。
    /// 不存在、已过期、不匹配统一返回 false。
    pub async fn verify(&self, order_no: &str, candidate: &str) -> bool {
        let now = Utc::now();
        self.codes
            .read()
            .await
            .get(order_no)
            .is_some_and(|entry| entry.is_live(now) && entry.code == candidate)
    }

    pub async fn delete(&self, order_no: &str) {
        self.codes.write().await.remove(order_no);
    }

    /// 清理已过期的验证码，返回清理数量
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, entry| entry.is_live(now));
        before - codes.len()
    }

    #[cfg(test)]
    pub(crate) async fn insert_with_expiry(
        &self,
        order_no: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) {
        self.codes.write().await.insert(
            order_no.to_string(),
            CodeEntry {
                code: code.to_string(),
                expires_at,
            },
        );
    }
}
