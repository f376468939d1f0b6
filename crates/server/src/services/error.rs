//! Service-level error type.

use catalog_core::{ErrorKind, ProductValidationError};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::storage::StorageError;

/// Errors returned by the catalog, cart and image services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// The error kind surfaced to callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn product_not_found() -> Self {
        Self::NotFound("product not found".to_string())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("not found".to_string()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other @ (RepositoryError::Database(_) | RepositoryError::DataCorruption(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ProductValidationError> for ServiceError {
    fn from(err: ProductValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
