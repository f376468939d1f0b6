//! Product image uploads through the HTTP gateway.

use axum::http::StatusCode;
use catalog_integration_tests::{TEST_MAX_UPLOAD_BYTES, TestContext, bearer, multipart_request};
use catalog_server::testing::sample_draft;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

// ============================================================================
// Product Images
// ============================================================================

#[tokio::test]
async fn test_upload_stores_key_and_returns_signed_url() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    let uri = format!("/products/{}/image", product.id);

    let resp = ctx
        .send(multipart_request(&uri, Some(&bearer(1)), "image", "flats.png", PNG))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let key = format!("products/{}/flats.png", product.id);
    let stored = ctx.catalog.product(product.id).expect("product exists");
    assert_eq!(stored.image_key, key);
    assert_eq!(ctx.images.object(&key).as_deref(), Some(PNG));

    let body = resp.json();
    let url = body["url"].as_str().expect("url string");
    assert!(url.contains(&key));
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_product_read_returns_signed_url_not_key() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    let uri = format!("/products/{}/image", product.id);
    ctx.send(multipart_request(&uri, Some(&bearer(1)), "image", "flats.png", PNG))
        .await;

    let resp = ctx
        .send(catalog_integration_tests::request(
            axum::http::Method::GET,
            &format!("/products/{}", product.id),
            None,
            None,
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(body.get("image_key").is_none());
    assert!(
        body["image_url"]["url"]
            .as_str()
            .is_some_and(|url| url.contains("signature="))
    );
}

#[tokio::test]
async fn test_empty_file_is_rejected_without_storage_calls() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    let uri = format!("/products/{}/image", product.id);

    let resp = ctx
        .send(multipart_request(&uri, Some(&bearer(1)), "image", "flats.png", &[]))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "validation");
    assert_eq!(ctx.images.puts(), 0);
    assert_eq!(ctx.catalog.calls(), 0);
}

#[tokio::test]
async fn test_upload_for_missing_product_is_not_found() {
    let ctx = TestContext::new();
    let resp = ctx
        .send(multipart_request("/products/404/image", Some(&bearer(1)), "image", "a.png", PNG))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.images.puts(), 0);
}

#[tokio::test]
async fn test_catalog_failure_removes_uploaded_object() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    ctx.catalog.fail_next_image_update();
    let uri = format!("/products/{}/image", product.id);

    let resp = ctx
        .send(multipart_request(&uri, Some(&bearer(1)), "image", "flats.png", PNG))
        .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json()["message"], "internal server error");
    assert!(ctx.images.keys().is_empty());
    assert!(
        ctx.catalog
            .product(product.id)
            .is_some_and(|p| p.image_key.is_empty())
    );
}

#[tokio::test]
async fn test_replacing_image_removes_old_object() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    let uri = format!("/products/{}/image", product.id);
    let auth = bearer(1);

    ctx.send(multipart_request(&uri, Some(&auth), "image", "v1.png", PNG))
        .await;
    ctx.send(multipart_request(&uri, Some(&auth), "image", "v2.png", PNG))
        .await;

    assert_eq!(
        ctx.images.keys(),
        vec![format!("products/{}/v2.png", product.id)]
    );
}

#[tokio::test]
async fn test_upload_requires_token() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    let uri = format!("/products/{}/image", product.id);

    let resp = ctx
        .send(multipart_request(&uri, None, "image", "flats.png", PNG))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["message"], "missing token");
    assert_eq!(ctx.images.puts(), 0);
}

#[tokio::test]
async fn test_missing_image_field_is_bad_request() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    let uri = format!("/products/{}/image", product.id);

    let resp = ctx
        .send(multipart_request(&uri, Some(&bearer(1)), "photo", "flats.png", PNG))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.images.puts(), 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let ctx = TestContext::new();
    let product = ctx.catalog.seed(&sample_draft("Salt Flats"));
    let uri = format!("/products/{}/image", product.id);
    let big = vec![0_u8; TEST_MAX_UPLOAD_BYTES + 1];

    let resp = ctx
        .send(multipart_request(&uri, Some(&bearer(1)), "image", "big.png", &big))
        .await;
    assert_eq!(resp.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp.json()["error"], "validation");
    assert_eq!(ctx.images.puts(), 0);
}

// ============================================================================
// Temporary Images
// ============================================================================

#[tokio::test]
async fn test_temporary_upload_returns_public_url() {
    let ctx = TestContext::new();

    let resp = ctx
        .send(multipart_request("/images/temp", Some(&bearer(1)), "image", "draft.png", PNG))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json()["url"],
        "https://storage.test/catalog-images/temp/draft.png"
    );
    assert!(ctx.images.object("temp/draft.png").is_some());
    assert_eq!(ctx.catalog.calls(), 0);
}

#[tokio::test]
async fn test_temporary_upload_rejects_path_in_file_name() {
    let ctx = TestContext::new();

    let resp = ctx
        .send(multipart_request("/images/temp", Some(&bearer(1)), "image", "../x.png", PNG))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(ctx.images.keys().is_empty());
}
