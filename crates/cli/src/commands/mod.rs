//! Subcommand implementations.

pub mod fee;
pub mod migrate;
pub mod report;
pub mod seed;

use std::sync::Arc;

use emporium_catalog::{
    Catalog, CatalogConfig, CatalogError, ConfigError, MokaCacheProvider, PgCatalogStore, db,
};
use sqlx::PgPool;

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Connect to the configured database.
async fn connect(config: &CatalogConfig) -> Result<PgPool, CommandError> {
    let url = config.require_database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(url).await?)
}

/// Services over `PostgreSQL` with a process-local cache.
fn catalog(config: &CatalogConfig, pool: PgPool) -> Catalog {
    Catalog::new(
        Arc::new(PgCatalogStore::new(pool)),
        Arc::new(MokaCacheProvider::new(config.product_cache_capacity)),
        config,
    )
}
