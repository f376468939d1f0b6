//! Product route handlers.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use tracing::instrument;

use catalog_core::{Product, ProductDraft, ProductFilter, ProductId, SignedUrl};

use super::images::read_image_field;
use super::{JsonBody, PathParam, QueryParams};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::ProductView;
use crate::state::AppState;

/// List products, optionally filtered by `?category=`.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ProductFilter>,
) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(state.catalog_service().list_products(&filter).await?))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ProductId>,
) -> Result<Json<ProductView>> {
    Ok(Json(state.catalog_service().get_product(id).await?))
}

/// Create a product.
#[instrument(skip(state, draft))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(_user_id): RequireUser,
    JsonBody(draft): JsonBody<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog_service().create_product(&draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's writable fields.
#[instrument(skip(state, draft))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(_user_id): RequireUser,
    PathParam(id): PathParam<ProductId>,
    JsonBody(draft): JsonBody<ProductDraft>,
) -> Result<Json<Product>> {
    Ok(Json(
        state.catalog_service().update_product(id, &draft).await?,
    ))
}

/// Upload a product image from the multipart field `image`.
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireUser(_user_id): RequireUser,
    PathParam(id): PathParam<ProductId>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<SignedUrl>> {
    let upload = read_image_field(multipart?).await?;
    let url = state
        .image_service()
        .upload_for_product(id, &upload.file_name, upload.bytes)
        .await?;
    Ok(Json(url))
}
