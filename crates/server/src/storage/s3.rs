use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument};

use catalog_core::SignedUrl;

use super::{StorageError, content_type_for, strip_public_prefix};
use crate::config::StorageConfig;
use crate::ports::{ImageStore, ObjectRef};

/// S3-compatible implementation of [`ImageStore`].
#[derive(Debug, Clone)]
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    public_base: String,
    public_prefix: String,
}

impl S3ImageStore {
    /// Build a client from storage configuration.
    ///
    /// Static credentials are used when both key parts are configured;
    /// otherwise the default AWS credential chain applies.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        let loader = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret)) => loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret.expose_secret().to_owned(),
                None,
                None,
                "catalog-config",
            )),
            _ => loader,
        };

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .endpoint_url(config.endpoint.as_str())
            .force_path_style(true)
            .build();

        info!(bucket = %config.bucket, endpoint = %config.endpoint, "Object storage client initialized");

        Self::new(Client::from_conf(s3_config), config)
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client, config: &StorageConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            public_base: config.public_base_url.as_str().trim_end_matches('/').to_owned(),
            public_prefix: config.public_prefix(),
        }
    }
}

/// Presigning settings for a URL minted at `now` and valid for `ttl`.
///
/// S3 caps presigned URLs at one week; a longer TTL is a configuration error.
fn presigning_window(
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<(PresigningConfig, TimeDelta), StorageError> {
    let lifetime = TimeDelta::from_std(ttl)
        .map_err(|e| StorageError::Config(format!("signed URL TTL out of range: {e}")))?;
    let presigning = PresigningConfig::builder()
        .start_time(SystemTime::from(now))
        .expires_in(ttl)
        .build()
        .map_err(|e| StorageError::Config(format!("invalid signed URL TTL: {e}")))?;
    Ok((presigning, lifetime))
}

#[async_trait]
impl ImageStore for S3ImageStore {
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()))]
    async fn put(&self, key: &str, bytes: Bytes) -> Result<ObjectRef, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type_for(key))
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_owned(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!("Stored object");
        Ok(ObjectRef {
            key: key.to_owned(),
        })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => {
                debug!("Deleted object");
                Ok(())
            }
            // S3 returns 204 for missing keys; some compatible endpoints return 404.
            Err(e) if e.code() == Some("NoSuchKey") => Ok(()),
            Err(e) => Err(StorageError::Delete {
                key: key.to_owned(),
                message: DisplayErrorContext(&e).to_string(),
            }),
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<SignedUrl, StorageError> {
        let sign_error = |message: String| StorageError::Sign {
            key: key.to_owned(),
            message,
        };

        let now = Utc::now();
        let (presigning, lifetime) = presigning_window(now, ttl)?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| sign_error(DisplayErrorContext(&e).to_string()))?;

        Ok(SignedUrl {
            url: request.uri().to_string(),
            expires_at: now + lifetime,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{key}", self.public_base, self.bucket)
    }

    fn object_key(&self, reference: &str) -> String {
        strip_public_prefix(reference, &self.public_prefix)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_presigning_window_matches_ttl() {
        let now = Utc::now();
        let (presigning, lifetime) = presigning_window(now, Duration::from_secs(3600)).unwrap();
        assert_eq!(presigning.expires(), Duration::from_secs(3600));
        assert_eq!(lifetime, TimeDelta::hours(1));
    }

    #[test]
    fn test_ttl_over_one_week_is_config_error() {
        let ttl = Duration::from_secs(8 * 24 * 3600);
        assert!(matches!(
            presigning_window(Utc::now(), ttl),
            Err(StorageError::Config(_))
        ));
    }
}
