//! Storage ports used by the services.
//!
//! The services only talk to the relational store and the object store
//! through these traits. Postgres and S3 adapters live in [`crate::db`] and
//! [`crate::storage`]; in-memory adapters for tests live in `crate::testing`.
//!
//! Every implementation must be safe for concurrent use by many requests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use catalog_core::{CartItem, Product, ProductDraft, ProductFilter, ProductId, SignedUrl, UserId};

use crate::db::RepositoryError;
use crate::storage::StorageError;

/// Read/write access to product records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// List products matching the filter, ordered by ID.
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Fetch a product.
    ///
    /// Returns `Ok(None)` when the row is absent, so callers can tell "not
    /// found" apart from a failed query.
    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product, assigning its ID and timestamps.
    async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError>;

    /// Replace the writable fields of a product.
    ///
    /// Returns `RepositoryError::NotFound` when the product does not exist.
    async fn update(&self, id: ProductId, draft: &ProductDraft)
    -> Result<Product, RepositoryError>;

    /// Set only the image key and touch `updated_at`.
    ///
    /// Returns `RepositoryError::NotFound` when the product does not exist.
    async fn update_image_key(&self, id: ProductId, key: &str) -> Result<(), RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Per-user cart rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Insert a new item.
    ///
    /// Returns `RepositoryError::Conflict` when the user already has an item
    /// for the product.
    async fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError>;

    /// All of a user's items in insertion order.
    async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Set the quantity of an item. Returns whether a row changed.
    async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError>;

    /// Delete one item. Returns whether a row was deleted.
    async fn remove(&self, user_id: UserId, product_id: ProductId)
    -> Result<bool, RepositoryError>;

    /// Delete all of a user's items. Returns the number of rows deleted.
    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub key: String,
}

/// Binary object storage with time-limited read URLs.
///
/// Key derivation is the caller's job; the store writes exactly the key it is
/// given.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store bytes under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: Bytes) -> Result<ObjectRef, StorageError>;

    /// Delete the object under `key`. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Mint a URL that grants read access to `key` for `ttl`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<SignedUrl, StorageError>;

    /// Unsigned reference to `key`; readable only where the bucket allows it.
    fn public_url(&self, key: &str) -> String;

    /// Reduce a stored reference to a bare object key.
    ///
    /// Accepts either a bare key or a legacy fully-qualified public URL.
    fn object_key(&self, reference: &str) -> String;
}
