use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^1[3-9]\d{9}$").expect("valid mobile regex"))
}

/// 验证收货手机号（中国大陆11位手机号）
pub fn validate_cn_mobile(phone: &str) -> AppResult<()> {
    if !mobile_regex().is_match(phone) {
        return Err(AppError::ValidationError(
            "手机号格式无效，必须是11位手机号".to_string(),
        ));
    }

    Ok(())
}

/// 去除空格、短横线等分隔符
pub fn normalize_mobile(phone: &str) -> String {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 13 && digits.starts_with("86") {
        digits[2..].to_string()
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cn_mobile() {
        assert!(validate_cn_mobile("13812345678").is_ok());
        assert!(validate_cn_mobile("1381234567").is_err());
        assert!(validate_cn_mobile("12812345678").is_err());
        assert!(validate_cn_mobile("+8613812345678").is_err());
    }

    #[test]
    fn test_normalize_mobile() {
        assert_eq!(normalize_mobile("138 1234 5678"), "13812345678");
        assert_eq!(normalize_mobile("138-1234-5678"), "13812345678");
        assert_eq!(normalize_mobile("+86 138 1234 5678"), "13812345678");
    }
}
