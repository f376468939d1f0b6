//! Product repository backed by the `products` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use catalog_core::{Product, ProductDraft, ProductFilter, ProductId};

use super::RepositoryError;
use crate::ports::ProductCatalog;

const PRODUCT_COLUMNS: &str = "id, name, price, offer_price, category, description, quantity, \
     country_of_origin, dimensions, artist_name, image_key, created_at, updated_at";

/// Database row for a product.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: Decimal,
    offer_price: Option<Decimal>,
    category: String,
    description: String,
    quantity: i32,
    country_of_origin: Option<String>,
    dimensions: Option<String>,
    artist_name: Option<String>,
    image_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.id <= 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "product id {} is not positive",
                row.id
            )));
        }

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            offer_price: row.offer_price,
            category: row.category,
            description: row.description,
            quantity: row.quantity,
            country_of_origin: row.country_of_origin,
            dimensions: row.dimensions,
            artist_name: row.artist_name,
            image_key: row.image_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `PostgreSQL` implementation of [`ProductCatalog`].
#[derive(Debug, Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    /// Create a catalog over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    #[instrument(skip(self))]
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1::TEXT IS NULL OR category = $1) \
             ORDER BY id"
        ))
        .bind(filter.category_filter())
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed products");
        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products \
                 (name, price, offer_price, category, description, quantity, \
                  country_of_origin, dimensions, artist_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.offer_price)
        .bind(&draft.category)
        .bind(&draft.description)
        .bind(draft.quantity)
        .bind(&draft.country_of_origin)
        .bind(&draft.dimensions)
        .bind(&draft.artist_name)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = row.id, "Created product");
        Product::try_from(row)
    }

    #[instrument(skip(self, draft), fields(product_id = %id))]
    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET \
                 name = $2, price = $3, offer_price = $4, category = $5, \
                 description = $6, quantity = $7, country_of_origin = $8, \
                 dimensions = $9, artist_name = $10, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_i64())
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.offer_price)
        .bind(&draft.category)
        .bind(&draft.description)
        .bind(draft.quantity)
        .bind(&draft.country_of_origin)
        .bind(&draft.dimensions)
        .bind(&draft.artist_name)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(Product::try_from)
    }

    #[instrument(skip(self, key), fields(product_id = %id))]
    async fn update_image_key(&self, id: ProductId, key: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET image_key = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i64())
        .bind(key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
