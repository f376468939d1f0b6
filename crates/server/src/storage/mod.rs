//! Object storage for product images.
//!
//! [`S3ImageStore`] talks to any S3-compatible endpoint (GCS interoperability,
//! AWS S3, `MinIO`) using path-style addressing.

mod s3;

use thiserror::Error;

pub use s3::S3ImageStore;

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing an object failed.
    #[error("upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    /// Deleting an object failed.
    #[error("delete failed for {key}: {message}")]
    Delete { key: String, message: String },

    /// Minting a signed URL failed.
    #[error("signing failed for {key}: {message}")]
    Sign { key: String, message: String },

    /// The store is misconfigured.
    #[error("storage configuration error: {0}")]
    Config(String),
}

/// Content type for an object key, inferred from its extension.
#[must_use]
pub fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Strip a public URL prefix from a stored reference.
///
/// References that do not start with `prefix` are returned unchanged. Any
/// query string on a legacy URL is dropped.
#[must_use]
pub fn strip_public_prefix(reference: &str, prefix: &str) -> String {
    reference.strip_prefix(prefix).map_or_else(
        || reference.to_owned(),
        |key| key.split_once('?').map_or(key, |(key, _)| key).to_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("products/1/a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("products/1/a.png"), "image/png");
        assert_eq!(content_type_for("temp/b.webp"), "image/webp");
        assert_eq!(content_type_for("temp/noext"), "application/octet-stream");
    }

    #[test]
    fn test_strip_public_prefix() {
        let prefix = "https://storage.googleapis.com/art/";
        assert_eq!(
            strip_public_prefix("https://storage.googleapis.com/art/products/3/a.jpg", prefix),
            "products/3/a.jpg"
        );
        assert_eq!(
            strip_public_prefix(
                "https://storage.googleapis.com/art/products/3/a.jpg?X-Goog-Expires=60",
                prefix
            ),
            "products/3/a.jpg"
        );
        assert_eq!(
            strip_public_prefix("products/3/a.jpg", prefix),
            "products/3/a.jpg"
        );
    }
}
