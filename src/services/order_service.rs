use crate::entities::{OrderStatus, order_entity as orders, product_entity as products};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{PointLedgerService, StatusHistory};
use crate::utils::{generate_unique_order_no, normalize_mobile, validate_cn_mobile};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 兑换商品:
    /// 1. 商品必须上架且有库存
    /// 2. 扣减积分（余额不足则失败）
    /// 3. 扣减库存（where stock > 0）
    /// 4. 创建 pending 订单并写入第一条状态记录
    pub async fn redeem(
        &self,
        actor: &CurrentUser,
        request: RedeemProductRequest,
    ) -> AppResult<OrderResponse> {
        let shipping_phone = match request.shipping_phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => {
                let phone = normalize_mobile(phone);
                validate_cn_mobile(&phone)?;
                Some(phone)
            }
            _ => None,
        };

        let txn = self.pool.begin().await?;

        let product = products::Entity::find_by_id(request.product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("商品不存在".into()))?;

        if !product.is_redeemable() {
            return Err(AppError::ValidationError("商品已下架或库存不足".into()));
        }

        let stock_update = products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).sub(1),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(product.id))
            .filter(products::Column::Stock.gt(0))
            .exec(&txn)
            .await?;
        if stock_update.rows_affected != 1 {
            return Err(AppError::ValidationError("商品已下架或库存不足".into()));
        }

        let order_no = generate_unique_order_no(&txn).await?;
        let now = Utc::now();
        let order = orders::ActiveModel {
            order_no: Set(order_no),
            product_id: Set(product.id),
            user_id: Set(actor.id),
            points: Set(product.points_cost),
            status: Set(OrderStatus::Pending),
            shipping_name: Set(request.shipping_name.filter(|s| !s.trim().is_empty())),
            shipping_phone: Set(shipping_phone),
            shipping_address: Set(request.shipping_address.filter(|s| !s.trim().is_empty())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        PointLedgerService::debit(
            &txn,
            actor.id,
            product.points_cost,
            &format!("兑换商品: {}", product.name),
            Some(order.id),
        )
        .await?;

        StatusHistory::append(
            &txn,
            order.id,
            None,
            OrderStatus::Pending,
            Some("兑换商品".into()),
            Some(actor.id),
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Order created: id={} order_no={} user={} points={}",
            order.id,
            order.order_no,
            order.user_id,
            order.points
        );
        Ok(order.into())
    }

    pub async fn list_user_orders(
        &self,
        user_id: i64,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        self.list(Some(user_id), query).await
    }

    /// 全部订单（教师 / 管理员）
    pub async fn list_orders(
        &self,
        actor: &CurrentUser,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden);
        }
        self.list(None, query).await
    }

    async fn list(
        &self,
        user_id: Option<i64>,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = orders::Entity::find();
        if let Some(user_id) = user_id {
            base_query = base_query.filter(orders::Column::UserId.eq(user_id));
        }
        if let Some(status) = query.status {
            base_query = base_query.filter(orders::Column::Status.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(items, &params, total).map(Into::into))
    }

    /// 订单详情，仅下单用户本人或教师 / 管理员可见
    pub async fn get_order(
        &self,
        order_id: i64,
        actor: &CurrentUser,
    ) -> AppResult<OrderDetailResponse> {
        let order = self.find_visible(order_id, actor).await?;
        let history = StatusHistory::list_for_order(&self.pool, order.id).await?;

        Ok(OrderDetailResponse {
            order: order.into(),
            history: history.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn status_history(
        &self,
        order_id: i64,
        actor: &CurrentUser,
    ) -> AppResult<Vec<OrderStatusHistoryResponse>> {
        let order = self.find_visible(order_id, actor).await?;
        let history = StatusHistory::list_for_order(&self.pool, order.id).await?;
        Ok(history.into_iter().map(Into::into).collect())
    }

    async fn find_visible(&self, order_id: i64, actor: &CurrentUser) -> AppResult<orders::Model> {
        find_visible_order(&self.pool, order_id, actor)
            .await?
            .ok_or_else(|| AppError::NotFound("订单不存在".into()))
    }

    /// 教师 / 管理员手动修改订单状态。
    /// 取消或失败时退回积分并恢复库存；不会写入核销信息。
    pub async fn update_status(
        &self,
        order_id: i64,
        request: UpdateOrderStatusRequest,
        actor: &CurrentUser,
    ) -> AppResult<OrderResponse> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden);
        }

        let txn = self.pool.begin().await?;

        let order = orders::Entity::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("订单不存在".into()))?;

        let from = order.status;
        let to = request.status;
        if !from.can_transition_to(to) {
            return Err(AppError::ValidationError(format!(
                "订单状态不能从 {from} 变更为 {to}"
            )));
        }

        if matches!(to, OrderStatus::Cancelled | OrderStatus::Failed) {
            self.release_order(&txn, &order).await?;
        }

        let mut am = order.into_active_model();
        am.status = Set(to);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&txn).await?;

        StatusHistory::append(
            &txn,
            updated.id,
            Some(from),
            to,
            request.note.filter(|n| !n.trim().is_empty()),
            Some(actor.id),
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Order status updated: id={} order_no={} {from} -> {to} by {}",
            updated.id,
            updated.order_no,
            actor.id
        );
        Ok(updated.into())
    }

    /// 退回积分、恢复库存
    async fn release_order(&self, txn: &DatabaseTransaction, order: &orders::Model) -> AppResult<()> {
        PointLedgerService::credit(
            txn,
            order.user_id,
            order.points,
            &format!("订单退回: {}", order.order_no),
            Some(order.id),
        )
        .await?;

        products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).add(1),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(order.product_id))
            .exec(txn)
            .await?;

        Ok(())
    }
}

/// 按可见性读取订单：下单用户本人或教师 / 管理员。
/// 他人订单与不存在的订单一样返回 `None`，不暴露订单是否存在。
pub(crate) async fn find_visible_order<C>(
    conn: &C,
    order_id: i64,
    actor: &CurrentUser,
) -> Result<Option<orders::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let order = orders::Entity::find_by_id(order_id).one(conn).await?;
    Ok(order.filter(|o| o.user_id == actor.id || actor.is_staff()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{UserRole, user_entity as users};
    use crate::test_support::{insert_order, insert_product, insert_user, setup_db};

    fn student(id: i64) -> CurrentUser {
        CurrentUser {
            id,
            role: UserRole::Student,
        }
    }

    fn redeem_request(product_id: i64) -> RedeemProductRequest {
        RedeemProductRequest {
            product_id,
            shipping_name: Some("李四".into()),
            shipping_phone: Some("138 1234 5678".into()),
            shipping_address: None,
        }
    }

    #[tokio::test]
    async fn test_redeem_debits_points_and_records_history() {
        let db = setup_db().await;
        let user = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 120).await;
        let product = insert_product(&db, "笔记本", 50, 3).await;
        let service = OrderService::new(db.clone());

        let order = service
            .redeem(&student(user.id), redeem_request(product.id))
            .await
            .unwrap();

        assert!(order.order_no.starts_with("SP"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.points, 50);
        assert_eq!(order.shipping_phone.as_deref(), Some("13812345678"));
        assert!(order.verified_at.is_none());

        let user = users::Entity::find_by_id(user.id).one(&db).await.unwrap().unwrap();
        assert_eq!(user.points, 70);
        let product = products::Entity::find_by_id(product.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock, 2);

        let history = StatusHistory::list_for_order(&db, order.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_status, None);
        assert_eq!(history[0].to_status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_redeem_with_insufficient_points_changes_nothing() {
        let db = setup_db().await;
        let user = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 10).await;
        let product = insert_product(&db, "笔记本", 50, 3).await;
        let service = OrderService::new(db.clone());

        let err = service
            .redeem(&student(user.id), redeem_request(product.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        assert_eq!(orders::Entity::find().count(&db).await.unwrap(), 0);
        let product = products::Entity::find_by_id(product.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_redeem_rejects_sold_out_product_and_bad_phone() {
        let db = setup_db().await;
        let user = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 500).await;
        let sold_out = insert_product(&db, "书包", 50, 0).await;
        let service = OrderService::new(db.clone());

        let err = service
            .redeem(&student(user.id), redeem_request(sold_out.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let mut request = redeem_request(sold_out.id);
        request.shipping_phone = Some("12345".into());
        let err = service.redeem(&student(user.id), request).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_cancel_refunds_points_and_restores_stock() {
        let db = setup_db().await;
        let user = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 100).await;
        let teacher = insert_user(&db, "teacher_wang", "王老师", UserRole::Teacher, "pw", None, 0).await;
        let product = insert_product(&db, "笔记本", 50, 1).await;
        let service = OrderService::new(db.clone());
        let staff = CurrentUser {
            id: teacher.id,
            role: UserRole::Teacher,
        };

        let order = service
            .redeem(&student(user.id), redeem_request(product.id))
            .await
            .unwrap();
        let cancelled = service
            .update_status(
                order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Cancelled,
                    note: Some("学生申请取消".into()),
                },
                &staff,
            )
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let user = users::Entity::find_by_id(user.id).one(&db).await.unwrap().unwrap();
        assert_eq!(user.points, 100);
        let product = products::Entity::find_by_id(product.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock, 1);

        let detail = service.get_order(order.id, &staff).await.unwrap();
        assert_eq!(detail.history.len(), 2);
        assert_eq!(detail.history[1].from_status, Some(OrderStatus::Pending));
        assert_eq!(detail.history[1].to_status, OrderStatus::Cancelled);
        assert_eq!(detail.history[1].operator_id, Some(teacher.id));
        assert_eq!(detail.order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_status_rules() {
        let db = setup_db().await;
        let user = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 0).await;
        let admin = insert_user(&db, "admin", "管理员", UserRole::Admin, "pw", None, 0).await;
        let product = insert_product(&db, "笔记本", 50, 1).await;
        let order = insert_order(&db, "SP-2001", user.id, product.id, OrderStatus::Pending).await;
        let service = OrderService::new(db.clone());
        let staff = CurrentUser {
            id: admin.id,
            role: UserRole::Admin,
        };

        let err = service
            .update_status(
                order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Processing,
                    note: None,
                },
                &student(user.id),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let completed = service
            .update_status(
                order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Completed,
                    note: None,
                },
                &staff,
            )
            .await
            .unwrap();
        // 非核销方式完成的订单没有核销信息
        assert_eq!(completed.status, OrderStatus::Completed);
        assert!(completed.verified_at.is_none());

        let err = service
            .update_status(
                order.id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Pending,
                    note: None,
                },
                &staff,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_order_visibility_and_listing() {
        let db = setup_db().await;
        let owner = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 0).await;
        let other = insert_user(&db, "student_zhao", "赵六", UserRole::Student, "pw", None, 0).await;
        let product = insert_product(&db, "笔记本", 50, 1).await;
        let order = insert_order(&db, "SP-3001", owner.id, product.id, OrderStatus::Pending).await;
        insert_order(&db, "SP-3002", other.id, product.id, OrderStatus::Cancelled).await;
        let service = OrderService::new(db.clone());

        assert!(service.get_order(order.id, &student(owner.id)).await.is_ok());
        assert!(matches!(
            service.get_order(order.id, &student(other.id)).await,
            Err(AppError::NotFound(_))
        ));

        let mine = service
            .list_user_orders(owner.id, &OrderQuery::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 1);

        assert!(matches!(
            service
                .list_orders(&student(owner.id), &OrderQuery::default())
                .await,
            Err(AppError::Forbidden)
        ));

        let staff = CurrentUser {
            id: 0,
            role: UserRole::Admin,
        };
        let cancelled = service
            .list_orders(
                &staff,
                &OrderQuery {
                    status: Some(OrderStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cancelled.total, 1);
        assert_eq!(cancelled.data[0].order_no, "SP-3002");
    }

    #[tokio::test]
    async fn test_find_visible_order_hides_foreign_and_missing_orders() {
        let db = setup_db().await;
        let owner = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 0).await;
        let other = insert_user(&db, "student_zhao", "赵六", UserRole::Student, "pw", None, 0).await;
        let product = insert_product(&db, "笔记本", 50, 1).await;
        let order = insert_order(&db, "SP-4001", owner.id, product.id, OrderStatus::Pending).await;
        let teacher = CurrentUser {
            id: 0,
            role: UserRole::Teacher,
        };

        let found = find_visible_order(&db, order.id, &student(owner.id)).await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(order.id));
        let found = find_visible_order(&db, order.id, &teacher).await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(order.id));

        assert!(find_visible_order(&db, order.id, &student(other.id)).await.unwrap().is_none());
        assert!(find_visible_order(&db, order.id + 100, &teacher).await.unwrap().is_none());
    }
}
