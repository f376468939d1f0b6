//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::IdentityVerifier;
use crate::config::CatalogConfig;
use crate::ports::{CartStore, ImageStore, ProductCatalog};
use crate::services::{CartService, CatalogService, ProductImageService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// identity verifier and the services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    verifier: IdentityVerifier,
    catalog: Arc<dyn ProductCatalog>,
    catalog_service: CatalogService,
    cart_service: CartService,
    image_service: ProductImageService,
}

impl AppState {
    /// Create the state from configuration and storage adapters.
    #[must_use]
    pub fn new(
        config: &CatalogConfig,
        catalog: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self::from_parts(
            IdentityVerifier::new(&config.jwt_secret),
            catalog,
            carts,
            images,
            config.signed_url_ttl,
        )
    }

    /// Create the state from already-built parts.
    #[must_use]
    pub fn from_parts(
        verifier: IdentityVerifier,
        catalog: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
        images: Arc<dyn ImageStore>,
        signed_url_ttl: Duration,
    ) -> Self {
        let catalog_service = CatalogService::new(catalog.clone(), images.clone(), signed_url_ttl);
        let cart_service = CartService::new(catalog.clone(), carts);
        let image_service = ProductImageService::new(catalog.clone(), images, signed_url_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                verifier,
                catalog,
                catalog_service,
                cart_service,
                image_service,
            }),
        }
    }

    /// Get a reference to the bearer-token verifier.
    #[must_use]
    pub fn verifier(&self) -> &IdentityVerifier {
        &self.inner.verifier
    }

    /// Get a reference to the product catalog port (used for readiness).
    #[must_use]
    pub fn catalog(&self) -> &dyn ProductCatalog {
        self.inner.catalog.as_ref()
    }

    #[must_use]
    pub fn catalog_service(&self) -> &CatalogService {
        &self.inner.catalog_service
    }

    #[must_use]
    pub fn cart_service(&self) -> &CartService {
        &self.inner.cart_service
    }

    #[must_use]
    pub fn image_service(&self) -> &ProductImageService {
        &self.inner.image_service
    }
}
