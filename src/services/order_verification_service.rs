use crate::entities::{OrderStatus, order_entity as orders, user_entity as users};
use crate::error::VerificationError;
use crate::models::*;
use crate::services::order_service::find_visible_order;
use crate::services::{StatusHistory, VerificationCodeService};
use crate::utils::verify_password;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};

/// 订单核销
///
/// 核销流程:
/// 1. 在事务内锁定订单行（FOR UPDATE），检查前置条件
/// 2. 解析核销方式与参数
/// 3. 按方式校验凭据（验证码 / 下单人密码 / 下单人身份证 + 姓名 / 核销人密码）
/// 4. 条件更新订单（verified_at IS NULL），写入状态记录，提交
/// 5. 提交成功后删除验证码
#[derive(Clone)]
pub struct OrderVerificationService {
    pool: DatabaseConnection,
    codes: VerificationCodeService,
}

/// 核销前置条件，签发验证码时同样适用
pub(crate) fn ensure_verifiable(order: &orders::Model) -> Result<(), VerificationError> {
    if order.order_no.trim().is_empty() {
        log::error!("Order {} has no order number, data is corrupted", order.id);
        return Err(VerificationError::OrderDataInvalid);
    }
    if order.verified_at.is_some() {
        return Err(VerificationError::AlreadyVerified);
    }
    match order.status {
        OrderStatus::Cancelled => Err(VerificationError::OrderCancelled),
        OrderStatus::Completed => Err(VerificationError::OrderAlreadyCompleted),
        OrderStatus::Failed => Err(VerificationError::OrderFailed),
        OrderStatus::Pending | OrderStatus::Processing => Ok(()),
    }
}

impl OrderVerificationService {
    pub fn new(pool: DatabaseConnection, codes: VerificationCodeService) -> Self {
        Self { pool, codes }
    }

    pub async fn verify(
        &self,
        order_id: i64,
        request: VerifyOrderRequest,
        actor: &CurrentUser,
    ) -> Result<VerifyOrderResponse, VerificationError> {
        let requested_method = request.method.clone();
        let mut order_no = None;

        match self.try_verify(order_id, request, actor, &mut order_no).await {
            Ok(response) => {
                log::info!(
                    "Order verified: id={} order_no={} method={} actor={}",
                    order_id,
                    response.order.order_no,
                    response.method,
                    actor.id
                );
                Ok(response)
            }
            Err(VerificationError::Internal(detail)) => {
                log::error!(
                    "Order verification failed: id={} order_no={} method={} actor={} error={}",
                    order_id,
                    order_no.as_deref().unwrap_or("-"),
                    requested_method,
                    actor.id,
                    detail
                );
                Err(VerificationError::Internal(detail))
            }
            Err(e) => {
                log::warn!(
                    "Order verification rejected: id={} order_no={} method={} actor={} reason={}",
                    order_id,
                    order_no.as_deref().unwrap_or("-"),
                    requested_method,
                    actor.id,
                    e.code()
                );
                Err(e)
            }
        }
    }

    async fn try_verify(
        &self,
        order_id: i64,
        request: VerifyOrderRequest,
        actor: &CurrentUser,
        order_no: &mut Option<String>,
    ) -> Result<VerifyOrderResponse, VerificationError> {
        let txn = self.pool.begin().await?;

        // 并发核销同一订单时，后到的请求在此等待，随后看到 verified_at 已写入
        let order = orders::Entity::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(VerificationError::OrderNotFound)?;
        *order_no = Some(order.order_no.clone());

        ensure_verifiable(&order)?;

        let proof = request.into_proof()?;
        let method = proof.method();

        if !self.check_proof(&txn, &order, &proof, actor).await? {
            return Err(VerificationError::VerificationMismatch(
                method.mismatch_message(),
            ));
        }

        let now = Utc::now();
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::VerifiedAt, Expr::value(now))
            .col_expr(orders::Column::VerifiedBy, Expr::value(actor.id))
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::Completed))
            .col_expr(orders::Column::UpdatedAt, Expr::value(now))
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::VerifiedAt.is_null())
            .filter(
                orders::Column::Status.is_in([OrderStatus::Pending, OrderStatus::Processing]),
            )
            .exec(&txn)
            .await?;
        if result.rows_affected != 1 {
            return Err(VerificationError::AlreadyVerified);
        }

        StatusHistory::append(
            &txn,
            order.id,
            Some(order.status),
            OrderStatus::Completed,
            Some(format!("订单核销（方式: {method}）")),
            Some(actor.id),
        )
        .await?;

        let updated = orders::Entity::find_by_id(order.id)
            .one(&txn)
            .await?
            .ok_or_else(|| VerificationError::Internal("order missing after update".into()))?;

        txn.commit().await?;

        self.codes.delete(&updated.order_no).await;

        Ok(VerifyOrderResponse {
            method,
            order: updated.into(),
        })
    }

    async fn check_proof(
        &self,
        txn: &DatabaseTransaction,
        order: &orders::Model,
        proof: &VerificationProof,
        actor: &CurrentUser,
    ) -> Result<bool, VerificationError> {
        let matched = match proof {
            VerificationProof::Code { code } => self.codes.verify(&order.order_no, code).await,
            VerificationProof::Password { password } => {
                match users::Entity::find_by_id(order.user_id).one(txn).await? {
                    Some(purchaser) => verify_password(password, &purchaser.password_hash)?,
                    None => false,
                }
            }
            VerificationProof::IdCard { id_number, name } => {
                match users::Entity::find_by_id(order.user_id).one(txn).await? {
                    Some(purchaser) => {
                        purchaser.id_number.as_deref() == Some(id_number.as_str())
                            && purchaser.name == *name
                    }
                    None => false,
                }
            }
            // 校验的是核销人自己的密码，与下单人无关
            VerificationProof::Direct { admin_password } => {
                match users::Entity::find_by_id(actor.id).one(txn).await? {
                    Some(reviewer) => verify_password(admin_password, &reviewer.password_hash)?,
                    None => false,
                }
            }
        };
        Ok(matched)
    }

    /// 为订单签发（或重新签发）核销验证码，仅下单人本人或教师 / 管理员可操作
    pub async fn issue_code(
        &self,
        order_id: i64,
        actor: &CurrentUser,
    ) -> Result<IssueCodeResponse, VerificationError> {
        let order = self.find_visible(order_id, actor).await?;
        ensure_verifiable(&order)?;

        let code = self.codes.issue(&order.order_no).await;
        log::info!(
            "Verification code issued: order_id={} order_no={} actor={}",
            order.id,
            order.order_no,
            actor.id
        );

        Ok(IssueCodeResponse {
            order_no: order.order_no,
            code,
            expires_in: self.codes.ttl_secs(),
        })
    }

    pub async fn code_status(
        &self,
        order_id: i64,
        actor: &CurrentUser,
    ) -> Result<CodeStatusResponse, VerificationError> {
        let order = self.find_visible(order_id, actor).await?;
        Ok(CodeStatusResponse {
            exists: self.codes.exists(&order.order_no).await,
        })
    }

    async fn find_visible(
        &self,
        order_id: i64,
        actor: &CurrentUser,
    ) -> Result<orders::Model, VerificationError> {
        find_visible_order(&self.pool, order_id, actor)
            .await?
            .ok_or(VerificationError::OrderNotFound)
    }
}
