//! Product image uploads.
//!
//! A product upload touches two systems: the object store and the catalog.
//! The object is written first, then the catalog row is pointed at it. If the
//! catalog update fails the new object is deleted again, and after a
//! successful update the product's previous object (if its key differs) is
//! deleted. Both deletes are best effort; a failed delete is logged and does
//! not change the outcome of the call.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use catalog_core::{ProductId, SignedUrl, validate_image_key};

use super::ServiceError;
use crate::db::RepositoryError;
use crate::ports::{ImageStore, ProductCatalog};

/// Maximum length of an uploaded file name.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

const TEMP_PREFIX: &str = "temp";
const PRODUCT_PREFIX: &str = "products";

/// Object key for a product's image.
#[must_use]
pub fn product_image_key(product_id: ProductId, file_name: &str) -> String {
    format!("{PRODUCT_PREFIX}/{product_id}/{file_name}")
}

/// Object key for a temporary preview image.
#[must_use]
pub fn temp_image_key(file_name: &str) -> String {
    format!("{TEMP_PREFIX}/{file_name}")
}

fn validate_upload(file_name: &str, bytes: &Bytes) -> Result<(), ServiceError> {
    if file_name.trim().is_empty() {
        return Err(ServiceError::validation("file name is required"));
    }
    if file_name.chars().count() > MAX_FILE_NAME_LENGTH {
        return Err(ServiceError::validation(format!(
            "file name must be at most {MAX_FILE_NAME_LENGTH} characters"
        )));
    }
    if file_name.contains(['/', '\\']) || file_name.contains("..") {
        return Err(ServiceError::validation(
            "file name cannot contain path separators or '..'",
        ));
    }
    if bytes.is_empty() {
        return Err(ServiceError::validation("image data is empty"));
    }
    Ok(())
}

/// Uploads product and preview images.
#[derive(Clone)]
pub struct ProductImageService {
    catalog: Arc<dyn ProductCatalog>,
    images: Arc<dyn ImageStore>,
    signed_url_ttl: Duration,
}

impl ProductImageService {
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

    /// Store a preview image that is not attached to any product.
    ///
    /// Returns the object's unsigned public URL.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad file name or empty data and `Internal`
    /// if the upload fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_temporary(
        &self,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<String, ServiceError> {
        validate_upload(file_name, &bytes)?;
        let key = temp_image_key(file_name);
        validate_image_key(&key)?;

        self.images.put(&key, bytes).await?;
        info!(key = %key, "Stored temporary image");
        Ok(self.images.public_url(&key))
    }

    /// Store an image for a product and point the product at it.
    ///
    /// Returns a signed URL for the new image.
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive product ID, bad file name or empty
    ///   data; nothing is written
    /// - `NotFound` if the product does not exist (or disappears before the
    ///   catalog update)
    /// - `Internal` if the upload, catalog update or URL signing fails
    #[instrument(skip(self, bytes), fields(product_id = %product_id, size = bytes.len()))]
    pub async fn upload_for_product(
        &self,
        product_id: ProductId,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<SignedUrl, ServiceError> {
        if !product_id.is_positive() {
            return Err(ServiceError::validation("product id must be positive"));
        }
        validate_upload(file_name, &bytes)?;
        let key = product_image_key(product_id, file_name);
        validate_image_key(&key)?;

        let product = self
            .catalog
            .get_by_id(product_id)
            .await?
            .ok_or_else(ServiceError::product_not_found)?;
        let previous_key = product
            .has_image()
            .then(|| self.images.object_key(&product.image_key));

        self.images.put(&key, bytes).await?;

        if let Err(e) = self.catalog.update_image_key(product_id, &key).await {
            // Same key: the put replaced the object the catalog still points at.
            if previous_key.as_deref() != Some(key.as_str()) {
                self.delete_best_effort(&key, "compensating").await;
            }
            return Err(match e {
                RepositoryError::NotFound => ServiceError::product_not_found(),
                other => ServiceError::Internal(other.to_string()),
            });
        }
        info!(key = %key, "Product image updated");

        if let Some(previous) = previous_key.filter(|previous| *previous != key) {
            self.delete_best_effort(&previous, "stale").await;
        }

        Ok(self.images.signed_url(&key, self.signed_url_ttl).await?)
    }

    async fn delete_best_effort(&self, key: &str, reason: &'static str) {
        if let Err(e) = self.images.delete(key).await {
            warn!(key = %key, reason, error = %e, "Failed to delete image object");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::MockImageStore;
    use crate::testing::{InMemoryCatalog, InMemoryImageStore, sample_draft};
    use catalog_core::ErrorKind;

    const TTL: Duration = Duration::from_secs(3600);

    fn service() -> (
        ProductImageService,
        Arc<InMemoryCatalog>,
        Arc<InMemoryImageStore>,
    ) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let images = Arc::new(InMemoryImageStore::new());
        (
            ProductImageService::new(catalog.clone(), images.clone(), TTL),
            catalog,
            images,
        )
    }

    fn jpeg() -> Bytes {
        Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0])
    }

    #[tokio::test]
    async fn test_upload_records_key_and_returns_signed_url() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));

        let url = service
            .upload_for_product(product.id, "dune.jpg", jpeg())
            .await
            .unwrap();

        let key = format!("products/{}/dune.jpg", product.id);
        assert_eq!(catalog.product(product.id).unwrap().image_key, key);
        assert_eq!(images.object(&key), Some(jpeg()));
        assert!(url.url.contains(&key));
        assert!(url.expires_at > chrono::Utc::now());
    }

    #[tokio::test]
    async fn test_empty_bytes_touch_nothing() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let mut images = MockImageStore::new();
        images.expect_put().never();
        images.expect_delete().never();
        images.expect_signed_url().never();
        let service = ProductImageService::new(catalog.clone(), Arc::new(images), TTL);

        let err = service
            .upload_for_product(ProductId::new(1), "a.jpg", Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));
        let long_name = "a".repeat(MAX_FILE_NAME_LENGTH + 1);

        for (id, name) in [
            (ProductId::new(0), "a.jpg"),
            (product.id, ""),
            (product.id, long_name.as_str()),
            (product.id, "../etc/passwd"),
            (product.id, "nested/a.jpg"),
        ] {
            let err = service
                .upload_for_product(id, name, jpeg())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "name = {name:?}");
        }
        assert_eq!(images.puts(), 0);
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found_without_upload() {
        let (service, _, images) = service();
        let err = service
            .upload_for_product(ProductId::new(12), "a.jpg", jpeg())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(images.puts(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_catalog_untouched() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));
        images.set_fail_puts(true);

        let err = service
            .upload_for_product(product.id, "a.jpg", jpeg())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(catalog.product(product.id).unwrap().image_key.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_deletes_uploaded_object() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));
        catalog.fail_next_image_update();

        let err = service
            .upload_for_product(product.id, "a.jpg", jpeg())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(images.keys().is_empty());
        assert_eq!(images.deletes(), 1);
        assert!(catalog.product(product.id).unwrap().image_key.is_empty());
    }

    #[tokio::test]
    async fn test_product_vanishing_mid_upload_is_not_found() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));
        catalog.vanish_before_next_image_update();

        let err = service
            .upload_for_product(product.id, "a.jpg", jpeg())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(images.keys().is_empty());
    }

    #[tokio::test]
    async fn test_compensation_failure_still_reports_internal() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));
        catalog.fail_next_image_update();
        images.set_fail_deletes(true);

        let err = service
            .upload_for_product(product.id, "a.jpg", jpeg())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_replacing_image_deletes_previous_object() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));

        service
            .upload_for_product(product.id, "old.jpg", jpeg())
            .await
            .unwrap();
        service
            .upload_for_product(product.id, "new.jpg", jpeg())
            .await
            .unwrap();

        assert_eq!(
            images.keys(),
            vec![format!("products/{}/new.jpg", product.id)]
        );
    }

    #[tokio::test]
    async fn test_reupload_same_name_keeps_object() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));

        service
            .upload_for_product(product.id, "a.jpg", jpeg())
            .await
            .unwrap();
        service
            .upload_for_product(product.id, "a.jpg", Bytes::from_static(b"v2"))
            .await
            .unwrap();

        let key = format!("products/{}/a.jpg", product.id);
        assert_eq!(images.object(&key), Some(Bytes::from_static(b"v2")));
        assert_eq!(images.deletes(), 0);
    }

    #[tokio::test]
    async fn test_legacy_reference_is_cleaned_up() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));
        images.seed("products/legacy.jpg", jpeg());
        catalog.set_image_reference(
            product.id,
            "https://storage.test/catalog-images/products/legacy.jpg",
        );

        service
            .upload_for_product(product.id, "fresh.jpg", jpeg())
            .await
            .unwrap();

        assert!(images.object("products/legacy.jpg").is_none());
    }

    #[tokio::test]
    async fn test_stale_delete_failure_does_not_fail_upload() {
        let (service, catalog, images) = service();
        let product = catalog.seed(&sample_draft("Dune"));
        catalog.set_image_reference(product.id, "products/old.jpg");
        images.set_fail_deletes(true);

        service
            .upload_for_product(product.id, "new.jpg", jpeg())
            .await
            .unwrap();
        assert_eq!(
            catalog.product(product.id).unwrap().image_key,
            format!("products/{}/new.jpg", product.id)
        );
    }

    #[tokio::test]
    async fn test_temporary_upload_returns_public_url() {
        let (service, catalog, images) = service();

        let url = service.upload_temporary("preview.png", jpeg()).await.unwrap();
        assert_eq!(url, "https://storage.test/catalog-images/temp/preview.png");
        assert!(images.object("temp/preview.png").is_some());
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn test_temporary_upload_rejects_empty() {
        let (service, _, images) = service();
        let err = service
            .upload_temporary("preview.png", Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(images.puts(), 0);
    }
}
