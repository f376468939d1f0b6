//! The closed set of failure kinds reported by the catalog services.

use core::fmt;

use serde::{Deserialize, Serialize};

/// What went wrong, independent of transport.
///
/// Every service error carries exactly one kind. The HTTP boundary maps kinds
/// to status codes with an exhaustive match and never inspects message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Identity verification failed; the caller must re-authenticate.
    Auth,
    /// Caller-supplied data violates a stated constraint.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A state invariant would be violated (e.g. duplicate cart item).
    Conflict,
    /// A dependency failed; safe to retry after backoff.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }

    /// Whether retrying the same request unchanged may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_as_str() {
        for kind in [
            ErrorKind::Auth,
            ErrorKind::Validation,
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::Internal,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_only_internal_is_retryable() {
        assert!(ErrorKind::Internal.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::Conflict.is_retryable());
    }
}
