//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. The status code and
//! JSON body are chosen here and nowhere else; internal failures are logged
//! and captured to Sentry before a generic message goes back to the client.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use catalog_core::ErrorKind;

use crate::auth::AuthError;
use crate::services::ServiceError;

/// Application-level error type for the HTTP gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bearer token rejected.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// A service call failed.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// The request could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// The request body exceeded the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl AppError {
    /// The error kind surfaced to clients.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Service(err) => err.kind(),
            Self::BadRequest(_) | Self::PayloadTooLarge(_) => ErrorKind::Validation,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => status_for(self.kind()),
        }
    }

    /// Map an extractor rejection, keeping 413 for bodies over the limit.
    fn rejected(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::BadRequest(message)
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::rejected(err.status(), err.body_text())
    }
}

/// HTTP status for an error kind.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Auth => StatusCode::UNAUTHORIZED,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Capture server errors to Sentry
        if kind == ErrorKind::Internal {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match kind {
            ErrorKind::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error: kind.as_str(),
            message: &message,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_auth_error_is_unauthorized_with_message() {
        let response = AppError::from(AuthError::BadClaimType).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "auth");
        assert_eq!(body["message"], "bad claim type");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let err = AppError::from(ServiceError::Internal("connection refused".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal");
        assert_eq!(body["message"], "internal server error");
    }

    #[tokio::test]
    async fn test_payload_too_large_keeps_status() {
        let response = AppError::rejected(
            StatusCode::PAYLOAD_TOO_LARGE,
            "length limit exceeded".into(),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation");
        assert_eq!(body["message"], "length limit exceeded");
    }

    #[test]
    fn test_other_rejections_are_bad_request() {
        let err = AppError::rejected(StatusCode::UNSUPPORTED_MEDIA_TYPE, "no boundary".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::BadRequest("bad json".into()), StatusCode::BAD_REQUEST),
            (
                AppError::from(ServiceError::Validation("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(ServiceError::NotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(ServiceError::Conflict("x".into())),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(err.kind()), status);
        }
    }
}
