//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time:
//! ```text
//! migrations/
//! ├── 20250101000001_create_products.sql
//! └── 20250101000002_create_cart_items.sql
//! ```

use secrecy::SecretString;
use thiserror::Error;

/// Errors from the migrate command.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

fn database_url() -> Result<SecretString, MigrationError> {
    std::env::var("CATALOG_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("CATALOG_DATABASE_URL"))
}

/// Run all pending catalog migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or a
/// migration fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    let _ = dotenvy::dotenv();
    let database_url = database_url()?;

    tracing::info!("Connecting to catalog database...");
    let pool = catalog_server::db::create_pool(&database_url).await?;

    tracing::info!("Running catalog migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
