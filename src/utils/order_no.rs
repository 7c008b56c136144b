use crate::entities::order_entity;
use crate::error::AppResult;
use chrono::Utc;
use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

/// 订单号格式: SP + yyyyMMddHHmmss + 4位随机数
pub fn format_order_no(now: chrono::DateTime<Utc>, suffix: u16) -> String {
    format!("SP{}{:04}", now.format("%Y%m%d%H%M%S"), suffix % 10_000)
}

/// 生成数据库中不存在的订单号
pub async fn generate_unique_order_no<C>(conn: &C) -> AppResult<String>
where
    C: ConnectionTrait,
{
    loop {
        let suffix = rand::thread_rng().gen_range(0..10_000u16);
        let order_no = format_order_no(Utc::now(), suffix);

        let exists = order_entity::Entity::find()
            .filter(order_entity::Column::OrderNo.eq(order_no.as_str()))
            .count(conn)
            .await?;

        if exists == 0 {
            return Ok(order_no);
        }
    }
}
