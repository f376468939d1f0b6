//! HTTP route handlers for the catalog server.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness check
//! GET    /health/ready          - Readiness check (catalog reachable)
//!
//! # Products
//! GET    /products              - Product listing (?category=)
//! GET    /products/{id}         - Product detail
//! POST   /products              - Create product (auth)
//! PUT    /products/{id}         - Update product (auth)
//! POST   /products/{id}/image   - Upload product image, multipart `image` (auth)
//!
//! # Images
//! POST   /images/temp           - Upload preview image, multipart `image` (auth)
//!
//! # Cart (all require auth)
//! GET    /cart                  - Items in insertion order
//! POST   /cart                  - Add item
//! DELETE /cart                  - Clear cart
//! PUT    /cart/{product_id}     - Set quantity (0 removes)
//! DELETE /cart/{product_id}     - Remove item
//! ```

pub mod cart;
pub mod images;
pub mod products;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, State},
    http::StatusCode,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections use the error body format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path extractor whose rejections use the error body format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Query extractor whose rejections use the error body format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", get(products::show).put(products::update))
        .route("/{id}/image", post(products::upload_image))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show).post(cart::add).delete(cart::clear),
        )
        .route("/{product_id}", put(cart::update).delete(cart::remove))
}

/// Create the image routes router.
pub fn image_routes() -> Router<AppState> {
    Router::new().route("/temp", post(images::upload_temp))
}

/// Create all routes for the catalog server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/images", image_routes())
}

/// Build the application with state and the request body limit applied.
///
/// Observability layers (tracing, Sentry) are added by the binary.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the catalog store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.catalog().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
