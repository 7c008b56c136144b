use actix_cors::Cors;

/// 前端（学生端 / 教师核销端）跨域配置
///
/// 令牌通过 Authorization 头传递，不依赖 Cookie。
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
