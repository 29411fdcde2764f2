//! Database migration command.
//!
//! Migrations live in `crates/catalog/migrations/` and are embedded into the
//! binary, so `emporium migrate` works from any directory.
//!
//! ```text
//! migrations/
//! ├── 20250301000001_create_enums.sql
//! ├── 20250301000002_create_category.sql
//! ├── 20250301000003_create_product.sql
//! └── 20250301000004_create_sale.sql
//! ```

use emporium_catalog::{CatalogConfig, db};

use super::{CommandError, connect};

/// Apply pending catalog migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or
/// a migration fails.
pub async fn run(config: &CatalogConfig) -> Result<(), CommandError> {
    let pool = connect(config).await?;

    tracing::info!(
        available = db::MIGRATOR.iter().count(),
        "Running catalog migrations..."
    );
    db::run_migrations(&pool).await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
