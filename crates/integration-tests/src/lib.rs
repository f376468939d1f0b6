//! Integration tests for the catalog service.
//!
//! # Running Tests
//!
//! ```bash
//! # Gateway and service tests (in-memory adapters, no external services)
//! cargo test -p catalog-integration-tests
//!
//! # Postgres adapter tests
//! TEST_DATABASE_URL=postgres://... cargo test -p catalog-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_flow` - Cart lifecycle through the HTTP gateway
//! - `product_images` - Upload, compensation and signed URL behaviour
//! - `http_gateway` - Auth, routing and error mapping
//! - `postgres_store` - Postgres adapters against a live database

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use bytes::Bytes;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use catalog_core::UserId;
use catalog_server::auth::{IdentityVerifier, issue_token};
use catalog_server::routes;
use catalog_server::state::AppState;
use catalog_server::testing::{InMemoryCartStore, InMemoryCatalog, InMemoryImageStore};

/// Shared secret for test tokens.
pub const TEST_SECRET: &str = "Zq8wT3nV6yB1mK4pR7sX0cF2hJ5gL9dA";

/// Upload limit applied to the test router.
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

const BOUNDARY: &str = "catalog-test-boundary";

/// Router plus handles on the in-memory adapters behind it.
pub struct TestContext {
    pub catalog: Arc<InMemoryCatalog>,
    pub carts: Arc<InMemoryCartStore>,
    pub images: Arc<InMemoryImageStore>,
    app: Router,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Build a router over fresh in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let carts = Arc::new(InMemoryCartStore::new());
        let images = Arc::new(InMemoryImageStore::new());

        let state = AppState::from_parts(
            IdentityVerifier::new(&secret()),
            catalog.clone(),
            carts.clone(),
            images.clone(),
            Duration::from_secs(3600),
        );

        Self {
            catalog,
            carts,
            images,
            app: routes::app(state, TEST_MAX_UPLOAD_BYTES),
        }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// The shared secret as a `SecretString`.
#[must_use]
pub fn secret() -> SecretString {
    SecretString::from(TEST_SECRET)
}

/// `Authorization` header value for `user`.
///
/// # Panics
///
/// Panics if signing fails.
#[must_use]
pub fn bearer(user: i64) -> String {
    let token = issue_token(&secret(), UserId::new(user), Some(Duration::from_secs(300)))
        .expect("sign test token");
    format!("Bearer {token}")
}

/// Build a request with an optional JSON body and `Authorization` header.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    request.expect("valid request")
}

/// Build a multipart upload with a single file field.
///
/// # Panics
///
/// Panics if the request cannot be built.
#[must_use]
pub fn multipart_request(
    uri: &str,
    auth: Option<&str>,
    field: &str,
    file_name: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body)).expect("valid request")
}
