//! Cart route handlers.
//!
//! Every handler requires a bearer token; the verified user ID selects the
//! cart.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use catalog_core::{CartItem, ProductId};

use super::{JsonBody, PathParam};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Body of `POST /cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `PUT /cart/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Show the caller's cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Vec<CartItem>>> {
    Ok(Json(state.cart_service().get_cart(user_id).await?))
}

/// Add a product to the caller's cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    JsonBody(request): JsonBody<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let item = state
        .cart_service()
        .add_to_cart(user_id, request.product_id, request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Set the quantity of a cart item.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    PathParam(product_id): PathParam<ProductId>,
    JsonBody(request): JsonBody<UpdateCartItemRequest>,
) -> Result<StatusCode> {
    state
        .cart_service()
        .update_cart_item(user_id, product_id, request.quantity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a cart item.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    PathParam(product_id): PathParam<ProductId>,
) -> Result<StatusCode> {
    state
        .cart_service()
        .remove_cart_item(user_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the caller's cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<StatusCode> {
    state.cart_service().clear_cart(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
