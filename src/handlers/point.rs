use super::current_user;
use crate::models::*;
use crate::services::PointLedgerService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/points/transactions",
    tag = "point",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前用户积分流水"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_transactions(
    point_service: web::Data<PointLedgerService>,
    req: HttpRequest,
    query: web::Query<PointTransactionQuery>,
) -> Result<HttpResponse> {
    let actor = match current_user(&req) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match point_service.list_transactions(actor.id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn point_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/points").route("/transactions", web::get().to(list_transactions)));
}
