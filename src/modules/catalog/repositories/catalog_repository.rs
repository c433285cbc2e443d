use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::modules::catalog::models::{CatalogItem, CatalogItemRow};

/// Item lookup owned by the catalog; checkout only reads it
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find_item(&self, item_id: &str) -> Result<Option<CatalogItem>>;
}

/// Reads the `items` table, which joins books and judgments with their seller
#[derive(Clone)]
pub struct MySqlCatalogLookup {
    pool: MySqlPool,
}

impl MySqlCatalogLookup {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogLookup for MySqlCatalogLookup {
    async fn find_item(&self, item_id: &str) -> Result<Option<CatalogItem>> {
        let row = sqlx::query_as::<_, CatalogItemRow>(
            r#"
            SELECT i.id, i.title, i.status, i.price, i.discounted_price,
                   i.seller_id, s.seller_type
            FROM items i
            JOIN sellers s ON s.id = i.seller_id
            WHERE i.id = ?
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogItem::try_from).transpose()
    }
}
