use crate::entities::{OrderStatus, order_status_history_entity as history};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

/// 订单状态变更记录（只追加）
///
/// 所有函数都接受任意连接，调用方应当在修改订单状态的同一事务里调用 `append`。
pub struct StatusHistory;

impl StatusHistory {
    pub async fn append<C>(
        conn: &C,
        order_id: i64,
        from_status: Option<OrderStatus>,
        to_status: OrderStatus,
        note: Option<String>,
        operator_id: Option<i64>,
    ) -> Result<history::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        history::ActiveModel {
            order_id: Set(order_id),
            from_status: Set(from_status),
            to_status: Set(to_status),
            note: Set(note),
            operator_id: Set(operator_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await
    }

    /// 按时间正序返回订单的全部状态记录
    pub async fn list_for_order<C>(conn: &C, order_id: i64) -> Result<Vec<history::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        history::Entity::find()
            .filter(history::Column::OrderId.eq(order_id))
            .order_by_asc(history::Column::CreatedAt)
            .order_by_asc(history::Column::Id)
            .all(conn)
            .await
    }
}
