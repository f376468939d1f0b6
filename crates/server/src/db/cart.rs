//! Cart repository backed by the `cart_items` table.
//!
//! Rows are keyed by `(user_id, product_id)`; the `seq` column preserves
//! insertion order for listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use catalog_core::{CartItem, ProductId, UserId};

use super::{RepositoryError, map_insert_error};
use crate::ports::CartStore;

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    user_id: i64,
    product_id: i64,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` implementation of [`CartStore`].
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a cart store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    async fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row: CartItemRow = sqlx::query_as(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(user_id.as_i64())
        .bind(product_id.as_i64())
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "product is already in the cart"))?;

        debug!("Inserted cart item");
        Ok(row.into())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows: Vec<CartItemRow> = sqlx::query_as(
            r"
            SELECT user_id, product_id, quantity, created_at, updated_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY seq
            ",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = $3, updated_at = NOW()
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id.as_i64())
        .bind(product_id.as_i64())
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_i64())
            .bind(product_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await?;

        debug!(deleted = result.rows_affected(), "Cleared cart");
        Ok(result.rows_affected())
    }
}
