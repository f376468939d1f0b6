//! Per-user cart lifecycle.
//!
//! Adding an item checks that the product exists; updates and removals are
//! blind and succeed even when the row is absent.

use std::sync::Arc;

use tracing::{info, instrument};

use catalog_core::{CartItem, ProductId, UserId};

use super::ServiceError;
use crate::db::RepositoryError;
use crate::ports::{CartStore, ProductCatalog};

/// Cart operations for an authenticated user.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn CartStore>,
}

impl CartService {
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>, store: Arc<dyn CartStore>) -> Self {
        Self { catalog, store }
    }

    /// Add a product to the user's cart.
    ///
    /// # Errors
    ///
    /// - `Validation` if `quantity` is less than 1
    /// - `NotFound` if the product does not exist
    /// - `Conflict` if the product is already in the cart
    /// - `Internal` if a store call fails
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::validation("quantity must be at least 1"));
        }

        if !product_id.is_positive() || self.catalog.get_by_id(product_id).await?.is_none() {
            return Err(ServiceError::product_not_found());
        }

        let item = self
            .store
            .insert(user_id, product_id, quantity)
            .await
            .map_err(|e| match e {
                // The product was deleted between the check and the insert.
                RepositoryError::NotFound => ServiceError::product_not_found(),
                other => other.into(),
            })?;

        info!(quantity, "Added item to cart");
        Ok(item)
    }

    /// All items in the user's cart, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the store call fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartItem>, ServiceError> {
        Ok(self.store.list(user_id).await?)
    }

    /// Set the quantity of a cart item.
    ///
    /// A quantity of zero removes the item. Updating an item that is not in
    /// the cart succeeds without changes.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a negative quantity and `Internal` if the
    /// store call fails.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn update_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::validation("quantity cannot be negative"));
        }
        if quantity == 0 {
            return self.remove_cart_item(user_id, product_id).await;
        }

        self.store
            .update_quantity(user_id, product_id, quantity)
            .await?;
        Ok(())
    }

    /// Remove an item from the cart. Removing an absent item succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the store call fails.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ServiceError> {
        self.store.remove(user_id, product_id).await?;
        Ok(())
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the store call fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), ServiceError> {
        let removed = self.store.clear(user_id).await?;
        info!(removed, "Cleared cart");
        Ok(())
    }
}
