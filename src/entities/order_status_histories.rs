use super::orders::OrderStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 订单状态变更记录
/// 说明:
/// - 只追加，不修改、不删除
/// - from_status 为空表示订单创建时的第一条记录
/// - operator_id 为空表示系统自动触发的变更
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "order_status_histories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub note: Option<String>,
    pub operator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
