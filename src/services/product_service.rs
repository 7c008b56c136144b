use crate::entities::product_entity as products;
use crate::error::{AppError, AppResult};
use crate::models::{PaginatedResponse, PaginationParams, ProductQuery, ProductResponse};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

#[derive(Clone)]
pub struct ProductService {
    pool: DatabaseConnection,
}

impl ProductService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 上架中的商品（分页）
    pub async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> AppResult<PaginatedResponse<ProductResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base_query = products::Entity::find().filter(products::Column::IsActive.eq(true));

        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_asc(products::Column::PointsCost)
            .order_by_asc(products::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(items, &params, total).map(Into::into))
    }

    pub async fn get_product(&self, product_id: i64) -> AppResult<ProductResponse> {
        products::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("商品不存在".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_product, setup_db};
    use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

    #[tokio::test]
    async fn test_list_only_active_products() {
        let db = setup_db().await;
        insert_product(&db, "橡皮", 10, 5).await;
        let hidden = insert_product(&db, "书包", 300, 2).await;
        let mut am = hidden.into_active_model();
        am.is_active = Set(false);
        am.update(&db).await.unwrap();

        let service = ProductService::new(db);
        let page = service.list_products(&ProductQuery::default()).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "橡皮");
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let db = setup_db().await;
        let service = ProductService::new(db);

        assert!(matches!(
            service.get_product(1).await,
            Err(AppError::NotFound(_))
        ));
    }
}
