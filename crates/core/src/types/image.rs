//! Time-limited image URLs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A URL granting temporary read access to a stored object.
///
/// Derived from an object key on every read and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrl {
    /// Whether the URL is still valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
