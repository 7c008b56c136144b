use super::current_user;
use crate::error::AppError;
use crate::models::*;
use crate::services::{OrderService, OrderVerificationService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

macro_rules! actor_or_respond {
    ($req:expr) => {
        match current_user(&$req) {
            Ok(actor) => actor,
            Err(e) => return Ok(e.error_response()),
        }
    };
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "订单状态")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前用户的订单列表"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_my_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match order_service.list_user_orders(actor.id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders",
    tag = "order",
    request_body = RedeemProductRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑换成功", body = OrderResponse),
        (status = 400, description = "积分不足 / 商品不可兑换 / 手机号格式错误"),
        (status = 404, description = "商品不存在")
    )
)]
pub async fn redeem_product(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<RedeemProductRequest>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match order_service.redeem(&actor, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "兑换成功",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "订单状态")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "全部订单"),
        (status = 403, description = "仅教师或管理员可访问")
    )
)]
pub async fn get_all_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match order_service.list_orders(&actor, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "order",
    params(("id" = i64, Path, description = "订单ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "订单详情（含状态记录）", body = OrderDetailResponse),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match order_service.get_order(path.into_inner(), &actor).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}/history",
    tag = "order",
    params(("id" = i64, Path, description = "订单ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "订单状态变更记录（按时间正序）"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn get_order_history(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match order_service.status_history(path.into_inner(), &actor).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{id}/verification-code",
    tag = "verification",
    params(("id" = i64, Path, description = "订单ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "验证码已生成（24 小时内有效，重新生成会覆盖旧码）", body = IssueCodeResponse),
        (status = 400, description = "订单已核销 / 已取消 / 已完成"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn issue_verification_code(
    verification_service: web::Data<OrderVerificationService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match verification_service
        .issue_code(path.into_inner(), &actor)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}/verification-code",
    tag = "verification",
    params(("id" = i64, Path, description = "订单ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "是否存在有效验证码", body = CodeStatusResponse),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn get_verification_code_status(
    verification_service: web::Data<OrderVerificationService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match verification_service
        .code_status(path.into_inner(), &actor)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{id}/verify",
    tag = "verification",
    params(("id" = i64, Path, description = "订单ID")),
    request_body = VerifyOrderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "核销成功", body = VerifyOrderResponse),
        (status = 400, description = "订单已核销 / 已取消 / 已完成，或凭据不匹配"),
        (status = 403, description = "仅教师或管理员可核销"),
        (status = 404, description = "订单不存在"),
        (status = 422, description = "核销方式无效或参数缺失"),
        (status = 500, description = "订单数据异常或服务器内部错误")
    )
)]
pub async fn verify_order(
    verification_service: web::Data<OrderVerificationService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<VerifyOrderRequest>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);
    if !actor.is_staff() {
        return Ok(AppError::Forbidden.error_response());
    }

    match verification_service
        .verify(path.into_inner(), request.into_inner(), &actor)
        .await
    {
        Ok(response) => {
            let message = response.method.success_message();
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(response, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    tag = "admin",
    params(("id" = i64, Path, description = "订单ID")),
    request_body = UpdateOrderStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "状态已更新", body = OrderResponse),
        (status = 400, description = "不允许的状态变更"),
        (status = 403, description = "仅教师或管理员可操作"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn update_order_status(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse> {
    let actor = actor_or_respond!(req);

    match order_service
        .update_status(path.into_inner(), request.into_inner(), &actor)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(get_my_orders))
            .route("", web::post().to(redeem_product))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}/history", web::get().to(get_order_history))
            .route(
                "/{id}/verification-code",
                web::post().to(issue_verification_code),
            )
            .route(
                "/{id}/verification-code",
                web::get().to(get_verification_code_status),
            )
            .service(
                web::resource("/{id}/verify")
                    .app_data(super::verification_json_config())
                    .route(web::post().to(verify_order)),
            )
            .route("/{id}/status", web::put().to(update_order_status)),
    );
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/admin").route("/orders", web::get().to(get_all_orders)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{OrderStatus, UserRole};
    use crate::middlewares::AuthMiddleware;
    use crate::services::VerificationCodeService;
    use crate::test_support::{insert_order, insert_product, insert_user, setup_db};
    use crate::utils::JwtService;
    use actix_web::{App, http::StatusCode, test};
    use sea_orm::EntityTrait;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_verify_endpoint_through_auth_middleware() {
        let db = setup_db().await;
        let student = insert_user(&db, "student_b", "李四", UserRole::Student, "pw", None, 0).await;
        let teacher =
            insert_user(&db, "teacher_a", "王老师", UserRole::Teacher, "teacher-pw", None, 0).await;
        let product = insert_product(&db, "笔记本", 50, 10).await;
        let order = insert_order(&db, "SP-1001", student.id, product.id, OrderStatus::Pending).await;

        let jwt = JwtService::new("test-secret", 3600, 7200);
        let codes = VerificationCodeService::new(24 * 3600);
        let code = codes.issue(&order.order_no).await;
        let verification_service = OrderVerificationService::new(db.clone(), codes);

        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt.clone()))
                .app_data(crate::handlers::json_config())
                .app_data(web::Data::new(verification_service))
                .service(web::scope("/api/v1").configure(order_config)),
        )
        .await;

        let student_token = jwt.generate_access_token(student.id, student.role).unwrap();
        let teacher_token = jwt.generate_access_token(teacher.id, teacher.role).unwrap();
        let uri = format!("/api/v1/orders/{}/verify", order.id);

        // 学生无权核销
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {student_token}")))
            .set_json(json!({ "method": "code", "code": code }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {teacher_token}")))
            .set_json(json!({ "method": "face_scan" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("INVALID_METHOD"));

        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {teacher_token}")))
            .set_json(json!({ "method": "code", "code": code }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("订单已通过验证码核销"));
        assert_eq!(body["data"]["order"]["status"], json!("completed"));
        assert_eq!(body["data"]["order"]["verified_by"], json!(teacher.id));

        // 重复核销
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {teacher_token}")))
            .set_json(json!({ "method": "direct", "admin_password": "teacher-pw" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], json!("ALREADY_VERIFIED"));
    }

    #[actix_web::test]
    async fn test_malformed_verify_body_uses_error_envelope() {
        let db = setup_db().await;
        let student = insert_user(&db, "student_b", "李四", UserRole::Student, "pw", None, 0).await;
        let teacher =
            insert_user(&db, "teacher_a", "王老师", UserRole::Teacher, "teacher-pw", None, 0).await;
        let product = insert_product(&db, "笔记本", 50, 10).await;
        let order = insert_order(&db, "SP-1001", student.id, product.id, OrderStatus::Pending).await;

        let jwt = JwtService::new("test-secret", 3600, 7200);
        let verification_service =
            OrderVerificationService::new(db.clone(), VerificationCodeService::new(24 * 3600));

        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt.clone()))
                .app_data(crate::handlers::json_config())
                .app_data(web::Data::new(verification_service))
                .service(web::scope("/api/v1").configure(order_config)),
        )
        .await;

        let token = jwt.generate_access_token(teacher.id, teacher.role).unwrap();
        let uri = format!("/api/v1/orders/{}/verify", order.id);

        // 缺少 method
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("INVALID_METHOD"));

        // 验证码以数字而非字符串提交
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({ "method": "code", "code": 482913 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("VALIDATION_FAILED"));
        assert!(body["errors"]["body"].is_string());

        // 不是 JSON
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("method=code")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], json!("VALIDATION_FAILED"));

        let order = crate::entities::order_entity::Entity::find_by_id(order.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.verified_at.is_none());
    }
}
