use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{OrderStatus, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::product::list_products,
        handlers::product::get_product,
        handlers::order::get_my_orders,
        handlers::order::redeem_product,
        handlers::order::get_all_orders,
        handlers::order::get_order,
        handlers::order::get_order_history,
        handlers::order::issue_verification_code,
        handlers::order::get_verification_code_status,
        handlers::order::verify_order,
        handlers::order::update_order_status,
        handlers::point::list_transactions,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            LoginRequest,
            RefreshTokenRequest,
            AuthResponse,
            ProductResponse,
            OrderStatus,
            OrderResponse,
            OrderStatusHistoryResponse,
            OrderDetailResponse,
            RedeemProductRequest,
            UpdateOrderStatusRequest,
            VerificationMethod,
            VerifyOrderRequest,
            VerifyOrderResponse,
            IssueCodeResponse,
            CodeStatusResponse,
            PointTransactionResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "登录与令牌刷新"),
        (name = "product", description = "积分商品"),
        (name = "order", description = "积分兑换订单"),
        (name = "verification", description = "订单核销（验证码 / 密码 / 身份证 / 直接核销）"),
        (name = "point", description = "积分流水"),
        (name = "admin", description = "教师 / 管理员订单管理"),
    ),
    info(
        title = "Points Mall API",
        version = "1.0.0",
        description = "学生积分商城后端 REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
