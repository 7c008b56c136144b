use rand::Rng;

/// 生成6位数字验证码（允许前导零，如 "048213"）
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..=999_999))
}
