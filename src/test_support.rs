//! 测试辅助: 内存 SQLite 数据库与基础数据

use crate::database::run_migrations;
use crate::entities::{
    OrderStatus, UserRole, order_entity as orders, product_entity as products,
    user_entity as users,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

/// 单连接的内存数据库：同一连接上的事务天然串行。
/// 表结构由与生产环境相同的迁移创建。
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

pub async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    name: &str,
    role: UserRole,
    password: &str,
    id_number: Option<&str>,
    points: i64,
) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        username: Set(username.to_string()),
        name: Set(name.to_string()),
        // 测试中使用最低 cost，避免 bcrypt 拖慢用例
        password_hash: Set(bcrypt::hash(password, 4).unwrap()),
        role: Set(role),
        id_number: Set(id_number.map(str::to_string)),
        points: Set(points),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_product(
    db: &DatabaseConnection,
    name: &str,
    points_cost: i64,
    stock: i64,
) -> products::Model {
    let now = Utc::now();
    products::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        points_cost: Set(points_cost),
        stock: Set(stock),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_order(
    db: &DatabaseConnection,
    order_no: &str,
    user_id: i64,
    product_id: i64,
    status: OrderStatus,
) -> orders::Model {
    let now = Utc::now();
    orders::ActiveModel {
        order_no: Set(order_no.to_string()),
        product_id: Set(product_id),
        user_id: Set(user_id),
        points: Set(50),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
