//! Development bearer tokens.
//!
//! Mints a token signed with `JWT_SECRET` so the cart and upload endpoints can
//! be exercised locally:
//!
//! ```bash
//! TOKEN=$(catalog-cli token --user 42 --ttl-secs 3600)
//! curl -H "Authorization: Bearer $TOKEN" localhost:8080/cart
//! ```

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use catalog_core::UserId;
use catalog_server::auth::issue_token;

/// Errors from the token command.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("User ID must be positive, got {0}")]
    InvalidUser(i64),

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Mint a token for `user`, valid for `ttl_secs` seconds (no expiry if `None`).
///
/// # Errors
///
/// Returns an error if `JWT_SECRET` is unset, the user ID is not positive or
/// signing fails.
pub fn issue(user: i64, ttl_secs: Option<u64>) -> Result<String, TokenError> {
    let _ = dotenvy::dotenv();

    let user_id = UserId::new(user);
    if !user_id.is_positive() {
        return Err(TokenError::InvalidUser(user));
    }

    let secret = std::env::var("JWT_SECRET")
        .map(SecretString::from)
        .map_err(|_| TokenError::MissingEnvVar("JWT_SECRET"))?;

    Ok(issue_token(
        &secret,
        user_id,
        ttl_secs.map(Duration::from_secs),
    )?)
}
