use crate::entities::point_transaction_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PointTransactionResponse {
    pub id: i64,
    pub amount: i64,
    pub balance_after: i64,
    pub reason: String,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<point_transaction_entity::Model> for PointTransactionResponse {
    fn from(m: point_transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            amount: m.amount,
            balance_after: m.balance_after,
            reason: m.reason,
            order_id: m.order_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PointTransactionQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
