//! Bearer-token extractor.
//!
//! Handlers that take a [`RequireUser`] only run for requests carrying a
//! valid bearer token; the verified identity is passed to the services
//! explicitly.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use catalog_core::UserId;

use crate::auth::AuthError;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires a verified caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_cart(
///     State(state): State<AppState>,
///     RequireUser(user_id): RequireUser,
/// ) -> Result<Json<Vec<CartItem>>> {
///     Ok(Json(state.cart_service().get_cart(user_id).await?))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let user_id = state.verifier().verify(header)?;

        Span::current().record("user_id", user_id.as_i64());
        set_sentry_user(&user_id);

        Ok(Self(user_id))
    }
}
