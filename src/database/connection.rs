use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::entities::{
        OrderStatus, UserRole, order_entity as orders, order_status_history_entity as history,
        point_transaction_entity as ledger, product_entity as products, user_entity as users,
    };
    use crate::test_support::{insert_order, insert_product, insert_user, setup_db};
    use chrono::Utc;
    use sea_orm::{EntityTrait, Set};

    #[tokio::test]
    async fn test_migrations_match_entities() {
        let db = setup_db().await;

        // 查询会选出实体的全部列，迁移缺列或类型不符时这里会失败
        let user = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 5).await;
        let product = insert_product(&db, "笔记本", 50, 3).await;
        let order = insert_order(&db, "SP-0001", user.id, product.id, OrderStatus::Pending).await;

        assert_eq!(users::Entity::find().all(&db).await.unwrap(), vec![user]);
        assert_eq!(products::Entity::find().all(&db).await.unwrap(), vec![product]);
        assert_eq!(orders::Entity::find().all(&db).await.unwrap(), vec![order]);
        assert!(history::Entity::find().all(&db).await.unwrap().is_empty());
        assert!(ledger::Entity::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_no_is_unique() {
        let db = setup_db().await;
        let user = insert_user(&db, "student_li", "李四", UserRole::Student, "pw", None, 0).await;
        let product = insert_product(&db, "笔记本", 50, 3).await;
        insert_order(&db, "SP-0001", user.id, product.id, OrderStatus::Pending).await;

        let now = Utc::now();
        let duplicate = orders::ActiveModel {
            order_no: Set("SP-0001".to_string()),
            product_id: Set(product.id),
            user_id: Set(user.id),
            points: Set(50),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let result = orders::Entity::insert(duplicate).exec(&db).await;
        assert!(result.is_err());
    }
}
