use crate::entities::{point_transaction_entity as ledger, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{PaginatedResponse, PaginationParams, PointTransactionQuery, PointTransactionResponse};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// 积分账户
///
/// `credit` / `debit` 接受任意连接（连接池或事务），由调用方决定事务边界。
#[derive(Clone)]
pub struct PointLedgerService {
    pool: DatabaseConnection,
}

impl PointLedgerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 增加积分，返回变动后的余额
    pub async fn credit<C>(
        conn: &C,
        user_id: i64,
        amount: i64,
        reason: &str,
        order_id: Option<i64>,
    ) -> AppResult<i64>
    where
        C: ConnectionTrait,
    {
        if amount <= 0 {
            return Err(AppError::ValidationError("积分数量必须为正数".into()));
        }

        let result = users::Entity::update_many()
            .col_expr(
                users::Column::Points,
                Expr::col(users::Column::Points).add(amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("用户不存在".into()));
        }

        Self::record(conn, user_id, amount, reason, order_id).await
    }

    /// 扣减积分，余额不足时不做任何修改
    pub async fn debit<C>(
        conn: &C,
        user_id: i64,
        amount: i64,
        reason: &str,
        order_id: Option<i64>,
    ) -> AppResult<i64>
    where
        C: ConnectionTrait,
    {
        if amount <= 0 {
            return Err(AppError::ValidationError("积分数量必须为正数".into()));
        }

        let result = users::Entity::update_many()
            .col_expr(
                users::Column::Points,
                Expr::col(users::Column::Points).sub(amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Points.gte(amount))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let exists = users::Entity::find_by_id(user_id).count(conn).await? > 0;
            return Err(if exists {
                AppError::ValidationError("积分不足".into())
            } else {
                AppError::NotFound("用户不存在".into())
            });
        }

        Self::record(conn, user_id, -amount, reason, order_id).await
    }

    async fn record<C>(
        conn: &C,
        user_id: i64,
        amount: i64,
        reason: &str,
        order_id: Option<i64>,
    ) -> AppResult<i64>
    where
        C: ConnectionTrait,
    {
        let balance_after = users::Entity::find_by_id(user_id)
            .select_only()
            .column(users::Column::Points)
            .into_tuple::<i64>()
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("用户不存在".into()))?;

        ledger::ActiveModel {
            user_id: Set(user_id),
            amount: Set(amount),
            balance_after: Set(balance_after),
            reason: Set(reason.to_string()),
            order_id: Set(order_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        log::info!("Points changed: user={user_id} amount={amount} balance={balance_after} reason={reason}");
        Ok(balance_after)
    }

    /// 分页获取用户积分流水（倒序）
    pub async fn list_transactions(
        &self,
        user_id: i64,
        query: &PointTransactionQuery,
    ) -> AppResult<PaginatedResponse<PointTransactionResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base_query = ledger::Entity::find().filter(ledger::Column::UserId.eq(user_id));

        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_desc(ledger::Column::CreatedAt)
            .order_by_desc(ledger::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(items, &params, total).map(Into::into))
    }
}
