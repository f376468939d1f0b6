//! In-memory adapters for tests.
//!
//! Each adapter implements its port with the same observable semantics as
//! the production adapter and counts calls so tests can assert that a
//! rejected request never reached storage. Failure switches let tests drive
//! the error paths of the services.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeDelta, Utc};

use catalog_core::{CartItem, Product, ProductDraft, ProductFilter, ProductId, SignedUrl, UserId};

use crate::db::RepositoryError;
use crate::ports::{CartStore, ImageStore, ObjectRef, ProductCatalog};
use crate::storage::{StorageError, strip_public_prefix};

/// Public base used by [`InMemoryImageStore`].
pub const TEST_PUBLIC_BASE: &str = "https://storage.test";
/// Bucket used by [`InMemoryImageStore`].
pub const TEST_BUCKET: &str = "catalog-images";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_flag(flag: &AtomicBool) -> bool {
    flag.swap(false, Ordering::SeqCst)
}

/// A valid draft for tests that only care about one or two fields.
#[must_use]
pub fn sample_draft(name: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        price: rust_decimal::Decimal::new(4_500, 2),
        offer_price: None,
        category: "prints".to_string(),
        description: String::new(),
        quantity: 5,
        country_of_origin: None,
        dimensions: None,
        artist_name: None,
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Default)]
struct CatalogState {
    products: BTreeMap<ProductId, Product>,
    next_id: i64,
}

/// In-memory [`ProductCatalog`].
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
    calls: AtomicUsize,
    fail_next_image_update: AtomicBool,
    vanish_before_image_update: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product directly, bypassing call counting.
    pub fn seed(&self, draft: &ProductDraft) -> Product {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(state.next_id),
            name: draft.name.clone(),
            price: draft.price,
            offer_price: draft.offer_price,
            category: draft.category.clone(),
            description: draft.description.clone(),
            quantity: draft.quantity,
            country_of_origin: draft.country_of_origin.clone(),
            dimensions: draft.dimensions.clone(),
            artist_name: draft.artist_name.clone(),
            image_key: String::new(),
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        product
    }

    /// Overwrite a product's stored image reference directly.
    pub fn set_image_reference(&self, id: ProductId, reference: &str) {
        if let Some(product) = lock(&self.state).products.get_mut(&id) {
            product.image_key = reference.to_string();
        }
    }

    /// Read a product directly, bypassing call counting.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<Product> {
        lock(&self.state).products.get(&id).cloned()
    }

    /// Number of port calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next `update_image_key` fail with a database error.
    pub fn fail_next_image_update(&self) {
        self.fail_next_image_update.store(true, Ordering::SeqCst);
    }

    /// Delete the product right before the next `update_image_key` applies.
    pub fn vanish_before_next_image_update(&self) {
        self.vanish_before_image_update.store(true, Ordering::SeqCst);
    }

    /// Make every call fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn record(&self) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        self.record()?;
        let category = filter.category_filter();
        Ok(lock(&self.state)
            .products
            .values()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.record()?;
        Ok(self.product(id))
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        self.record()?;
        Ok(self.seed(draft))
    }

    async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        self.record()?;
        let mut state = lock(&self.state);
        let product = state
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.name.clone_from(&draft.name);
        product.price = draft.price;
        product.offer_price = draft.offer_price;
        product.category.clone_from(&draft.category);
        product.description.clone_from(&draft.description);
        product.quantity = draft.quantity;
        product.country_of_origin.clone_from(&draft.country_of_origin);
        product.dimensions.clone_from(&draft.dimensions);
        product.artist_name.clone_from(&draft.artist_name);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn update_image_key(&self, id: ProductId, key: &str) -> Result<(), RepositoryError> {
        self.record()?;
        if take_flag(&self.fail_next_image_update) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut state = lock(&self.state);
        if take_flag(&self.vanish_before_image_update) {
            state.products.remove(&id);
        }
        let product = state
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        key.clone_into(&mut product.image_key);
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.record()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// In-memory [`CartStore`]. Items are kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    items: Mutex<Vec<CartItem>>,
    calls: AtomicUsize,
}

impl InMemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Whether no user has any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of port calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        self.record();
        let mut items = lock(&self.items);
        if items
            .iter()
            .any(|i| i.user_id == user_id && i.product_id == product_id)
        {
            return Err(RepositoryError::Conflict(
                "product is already in the cart".to_string(),
            ));
        }
        let now = Utc::now();
        let item = CartItem {
            user_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        self.record();
        Ok(lock(&self.items)
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        self.record();
        let mut items = lock(&self.items);
        let Some(item) = items
            .iter_mut()
            .find(|i| i.user_id == user_id && i.product_id == product_id)
        else {
            return Ok(false);
        };
        item.quantity = quantity;
        item.updated_at = Utc::now();
        Ok(true)
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        self.record();
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|i| !(i.user_id == user_id && i.product_id == product_id));
        Ok(items.len() < before)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        self.record();
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|i| i.user_id != user_id);
        Ok((before - items.len()) as u64)
    }
}

// =============================================================================
// Images
// =============================================================================

/// In-memory [`ImageStore`] addressed as bucket [`TEST_BUCKET`] under
/// [`TEST_PUBLIC_BASE`].
#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_signing: AtomicBool,
}

impl InMemoryImageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `key`, if any.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<Bytes> {
        lock(&self.objects).get(key).cloned()
    }

    /// All stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    /// Store an object directly, bypassing call counting.
    pub fn seed(&self, key: &str, bytes: impl Into<Bytes>) {
        lock(&self.objects).insert(key.to_string(), bytes.into());
    }

    #[must_use]
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_signing(&self, fail: bool) {
        self.fail_signing.store(fail, Ordering::SeqCst);
    }

    fn public_prefix() -> String {
        format!("{TEST_PUBLIC_BASE}/{TEST_BUCKET}/")
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<ObjectRef, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "injected failure".to_string(),
            });
        }
        lock(&self.objects).insert(key.to_string(), bytes);
        Ok(ObjectRef {
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete {
                key: key.to_string(),
                message: "injected failure".to_string(),
            });
        }
        lock(&self.objects).remove(key);
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<SignedUrl, StorageError> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StorageError::Sign {
                key: key.to_string(),
                message: "injected failure".to_string(),
            });
        }
        let lifetime = TimeDelta::from_std(ttl).map_err(|e| StorageError::Sign {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let expires_at = Utc::now() + lifetime;
        Ok(SignedUrl {
            url: format!(
                "{}?expires={}&signature=test",
                self.public_url(key),
                expires_at.timestamp()
            ),
            expires_at,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}{key}", Self::public_prefix())
    }

    fn object_key(&self, reference: &str) -> String {
        strip_public_prefix(reference, &Self::public_prefix())
    }
}
