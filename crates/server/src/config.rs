//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET` - Shared secret for verifying bearer tokens (min 32 chars, high entropy)
//! - `STORAGE_BUCKET` - Object storage bucket holding product images
//!
//! ## Optional
//! - `CATALOG_HOST` - Bind address (default: 127.0.0.1)
//! - `CATALOG_PORT` - Listen port (default: 8080)
//! - `STORAGE_ENDPOINT` - S3-compatible endpoint (default: `https://storage.googleapis.com`)
//! - `STORAGE_REGION` - Region passed to the signer (default: auto)
//! - `STORAGE_ACCESS_KEY_ID` / `STORAGE_SECRET_ACCESS_KEY` - HMAC credentials;
//!   when unset the default AWS credential chain is used
//! - `STORAGE_PUBLIC_BASE_URL` - Base of unsigned object URLs (default: the endpoint)
//! - `SIGNED_URL_TTL_SECS` - Lifetime of signed image URLs (default: 3600)
//! - `MAX_UPLOAD_BYTES` - Maximum accepted upload size (default: 10 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shared secret used to verify bearer tokens
    pub jwt_secret: SecretString,
    /// Object storage configuration
    pub storage: StorageConfig,
    /// Lifetime of signed image URLs
    pub signed_url_ttl: Duration,
    /// Maximum accepted request body size for uploads
    pub max_upload_bytes: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error event sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Object storage configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StorageConfig {
    /// Bucket holding product images
    pub bucket: String,
    /// S3-compatible API endpoint
    pub endpoint: Url,
    /// Region used when signing requests
    pub region: String,
    /// HMAC access key ID
    pub access_key_id: Option<String>,
    /// HMAC secret
    pub secret_access_key: Option<SecretString>,
    /// Base URL of unsigned object references, without the bucket
    pub public_base_url: Url,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint.as_str())
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("public_base_url", &self.public_base_url.as_str())
            .finish()
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (length, placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CATALOG_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("CATALOG_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("CATALOG_PORT", "8080")?;

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let storage = StorageConfig::from_env()?;

        let ttl_secs = parse_env_or_default::<u64>(
            "SIGNED_URL_TTL_SECS",
            &DEFAULT_SIGNED_URL_TTL_SECS.to_string(),
        )?;
        if ttl_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SIGNED_URL_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let max_upload_bytes = parse_env_or_default::<usize>(
            "MAX_UPLOAD_BYTES",
            &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            storage,
            signed_url_ttl: Duration::from_secs(ttl_secs),
            max_upload_bytes,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default::<f32>(
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.0",
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = parse_url(
            "STORAGE_ENDPOINT",
            &get_env_or_default("STORAGE_ENDPOINT", DEFAULT_STORAGE_ENDPOINT),
        )?;
        let public_base_url = match get_optional_env("STORAGE_PUBLIC_BASE_URL") {
            Some(value) => parse_url("STORAGE_PUBLIC_BASE_URL", &value)?,
            None => endpoint.clone(),
        };

        let access_key_id = get_optional_env("STORAGE_ACCESS_KEY_ID");
        let secret_access_key = get_optional_env("STORAGE_SECRET_ACCESS_KEY").map(SecretString::from);
        if access_key_id.is_some() != secret_access_key.is_some() {
            return Err(ConfigError::InvalidEnvVar(
                "STORAGE_ACCESS_KEY_ID".to_string(),
                "STORAGE_ACCESS_KEY_ID and STORAGE_SECRET_ACCESS_KEY must be set together"
                    .to_string(),
            ));
        }

        Ok(Self {
            bucket: get_required_env("STORAGE_BUCKET")?,
            endpoint,
            region: get_env_or_default("STORAGE_REGION", "auto"),
            access_key_id,
            secret_access_key,
            public_base_url,
        })
    }

    /// Prefix that legacy records stored in front of object keys.
    ///
    /// Older catalog rows hold full public URLs of the form
    /// `{public_base_url}/{bucket}/{key}` rather than bare keys.
    #[must_use]
    pub fn public_prefix(&self) -> String {
        format!(
            "{}/{}/",
            self.public_base_url.as_str().trim_end_matches('/'),
            self.bucket
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
