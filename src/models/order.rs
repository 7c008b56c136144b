use crate::entities::{OrderStatus, order_entity, order_status_history_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub order_no: String,
    pub product_id: i64,
    pub user_id: i64,
    pub points: i64,
    pub status: OrderStatus,
    pub shipping_name: Option<String>,
    pub shipping_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub third_party_order_id: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for OrderResponse {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            order_no: m.order_no,
            product_id: m.product_id,
            user_id: m.user_id,
            points: m.points,
            status: m.status,
            shipping_name: m.shipping_name,
            shipping_phone: m.shipping_phone,
            shipping_address: m.shipping_address,
            third_party_order_id: m.third_party_order_id,
            verified_at: m.verified_at,
            verified_by: m.verified_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderStatusHistoryResponse {
    pub id: i64,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub note: Option<String>,
    pub operator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<order_status_history_entity::Model> for OrderStatusHistoryResponse {
    fn from(m: order_status_history_entity::Model) -> Self {
        Self {
            id: m.id,
            from_status: m.from_status,
            to_status: m.to_status,
            note: m.note,
            operator_id: m.operator_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub history: Vec<OrderStatusHistoryResponse>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
}

/// 兑换商品（创建订单）
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemProductRequest {
    pub product_id: i64,
    #[schema(example = "张三")]
    pub shipping_name: Option<String>,
    #[schema(example = "13812345678")]
    pub shipping_phone: Option<String>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}
