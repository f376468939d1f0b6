//! Product reads and writes.
//!
//! Reads return [`ProductView`]s: the stored product plus a freshly minted
//! signed URL for its image. The stored record only ever holds the object key.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use catalog_core::{Product, ProductDraft, ProductFilter, ProductId, SignedUrl};

use super::ServiceError;
use crate::db::RepositoryError;
use crate::ports::{ImageStore, ProductCatalog};

/// A product as served to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub offer_price: Option<Decimal>,
    pub category: String,
    pub description: String,
    pub quantity: i32,
    pub country_of_origin: Option<String>,
    pub dimensions: Option<String>,
    pub artist_name: Option<String>,
    pub image_url: Option<SignedUrl>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    fn new(product: Product, image_url: Option<SignedUrl>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            offer_price: product.offer_price,
            category: product.category,
            description: product.description,
            quantity: product.quantity,
            country_of_origin: product.country_of_origin,
            dimensions: product.dimensions,
            artist_name: product.artist_name,
            image_url,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Catalog reads and product writes.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn ProductCatalog>,
    images: Arc<dyn ImageStore>,
    signed_url_ttl: Duration,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        images: Arc<dyn ImageStore>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            images,
            signed_url_ttl,
        }
    }

    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the catalog query or URL signing fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductView>, ServiceError> {
        let products = self.catalog.list(filter).await?;

        let mut views = Vec::with_capacity(products.len());
        for product in products {
            views.push(self.view(product).await?);
        }
        Ok(views)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist and `Internal` if the
    /// catalog query or URL signing fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductView, ServiceError> {
        let product = self
            .catalog
            .get_by_id(id)
            .await?
            .ok_or_else(ServiceError::product_not_found)?;

        self.view(product).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the draft breaks a business rule and
    /// `Internal` if the insert fails.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ServiceError> {
        draft.validate()?;
        let product = self.catalog.create(draft).await?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace the writable fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the draft breaks a business rule, `NotFound`
    /// if the product does not exist and `Internal` if the update fails.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ServiceError> {
        draft.validate()?;
        if !id.is_positive() {
            return Err(ServiceError::product_not_found());
        }

        let product = self.catalog.update(id, draft).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::product_not_found(),
            other => other.into(),
        })?;
        info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    async fn view(&self, product: Product) -> Result<ProductView, ServiceError> {
        let image_url = if product.has_image() {
            let key = self.images.object_key(&product.image_key);
            Some(self.images.signed_url(&key, self.signed_url_ttl).await?)
        } else {
            None
        };
        Ok(ProductView::new(product, image_url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryCatalog, InMemoryImageStore, sample_draft};
    use catalog_core::ErrorKind;

    const TTL: Duration = Duration::from_secs(3600);

    fn service() -> (CatalogService, Arc<InMemoryCatalog>, Arc<InMemoryImageStore>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let images = Arc::new(InMemoryImageStore::new());
        let service = CatalogService::new(catalog.clone(), images.clone(), TTL);
        (service, catalog, images)
    }

    #[tokio::test]
    async fn test_get_product_without_image_has_no_url() {
        let (service, catalog, _) = service();
        let product = catalog.seed(&sample_draft("Tide"));

        let view = service.get_product(product.id).await.unwrap();
        assert_eq!(view.name, "Tide");
        assert!(view.image_url.is_none());
    }

    #[tokio::test]
    async fn test_get_product_mints_signed_url_from_key() {
        let (service, catalog, _) = service();
        let product = catalog.seed(&sample_draft("Tide"));
        catalog.set_image_reference(product.id, "products/1/tide.jpg");

        let before = Utc::now();
        let view = service.get_product(product.id).await.unwrap();
        let url = view.image_url.unwrap();
        assert!(url.url.contains("products/1/tide.jpg"));
        assert!(url.url.contains("signature="));
        assert!(url.expires_at >= before + chrono::TimeDelta::seconds(3600));
    }

    #[tokio::test]
    async fn test_legacy_public_url_is_normalized_before_signing() {
        let (service, catalog, _) = service();
        let product = catalog.seed(&sample_draft("Tide"));
        catalog.set_image_reference(
            product.id,
            "https://storage.test/catalog-images/products/1/tide.jpg",
        );

        let url = service.get_product(product.id).await.unwrap().image_url.unwrap();
        assert_eq!(
            url.url.split('?').next().unwrap(),
            "https://storage.test/catalog-images/products/1/tide.jpg"
        );
    }

    #[tokio::test]
    async fn test_get_missing_product_is_not_found() {
        let (service, _, _) = service();
        let err = service.get_product(ProductId::new(99)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_signing_failure_is_internal() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Tide"));
        catalog.set_image_reference(product.id, "products/1/tide.jpg");
        images.set_fail_signing(true);

        let err = service.get_product(product.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let (service, catalog, _) = service();
        catalog.seed(&sample_draft("A"));
        let mut painting = sample_draft("B");
        painting.category = "paintings".to_string();
        catalog.seed(&painting);

        let all = service.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let paintings = service
            .list_products(&ProductFilter::category("paintings"))
            .await
            .unwrap();
        assert_eq!(paintings.len(), 1);
        assert_eq!(paintings[0].name, "B");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft_without_writing() {
        let (service, catalog, _) = service();
        let draft = sample_draft("");

        let err = service.create_product(&draft).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_assigns_id() {
        let (service, catalog, _) = service();
        let product = service.create_product(&sample_draft("New")).await.unwrap();
        assert!(product.id.is_positive());
        assert!(product.image_key.is_empty());
        assert!(catalog.product(product.id).is_some());
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let (service, _, _) = service();
        let err = service
            .update_product(ProductId::new(5), &sample_draft("X"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_keeps_image_key() {
        let (service, catalog, _) = service();
        let product = catalog.seed(&sample_draft("Old"));
        catalog.set_image_reference(product.id, "products/1/a.png");

        let updated = service
            .update_product(product.id, &sample_draft("New"))
            .await
            .unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.image_key, "products/1/a.png");
    }
}
