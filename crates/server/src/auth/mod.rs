//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs signed with the shared `JWT_SECRET`. The caller's
//! identity is the `sub` claim, which must be a positive JSON integer. An
//! `exp` claim is honoured when present but not required.

use std::time::Duration;

use catalog_core::UserId;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

/// Reasons a bearer token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("missing claim")]
    MissingClaim,
    #[error("bad claim type")]
    BadClaimType,
}

#[derive(Debug, Deserialize)]
struct VerifiedClaims {
    #[serde(default)]
    sub: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct IssuedClaims {
    sub: i64,
    iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Verifies bearer tokens against the shared secret.
#[derive(Clone)]
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl IdentityVerifier {
    /// Create a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Verify an `Authorization` header value and return the caller's identity.
    ///
    /// # Errors
    ///
    /// - `MissingToken` if the value has no `Bearer ` prefix or no token
    /// - `InvalidToken` if the signature, format or expiry check fails
    /// - `MissingClaim` if the token has no `sub` claim
    /// - `BadClaimType` if `sub` is not a positive integer
    pub fn verify(&self, authorization: &str) -> Result<UserId, AuthError> {
        let token = authorization
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let data = decode::<VerifiedClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;

        match data.claims.sub {
            None | Some(serde_json::Value::Null) => Err(AuthError::MissingClaim),
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .filter(|id| *id > 0)
                .map(UserId::new)
                .ok_or(AuthError::BadClaimType),
            Some(_) => Err(AuthError::BadClaimType),
        }
    }
}

/// Mint a bearer token for `user`.
///
/// Without a `ttl` the token carries no `exp` claim.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn issue_token(
    secret: &SecretString,
    user: UserId,
    ttl: Option<Duration>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = IssuedClaims {
        sub: user.as_i64(),
        iat: now,
        exp: ttl.map(|ttl| now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
}
