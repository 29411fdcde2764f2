//! Persistence boundary for the catalog.
//!
//! # Tables
//!
//! - `category` - Product categories (soft-deletable, unique live name)
//! - `product` - Listings with governance state (unique SKU)
//! - `price_history` - Append-only product price changes
//! - `sale` - Sale headers and totals
//! - `sale_item` - Sale lines with product snapshots
//! - `payment_info` - At most one payment per sale
//!
//! # Migrations
//!
//! Migrations are stored in `crates/catalog/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emporium_core::analytics::SaleRecord;
use emporium_core::category::{Category, CategorySummary, NewCategory};
use emporium_core::price_history::{NewPriceHistory, PriceHistory};
use emporium_core::product::{NewProduct, Product, ProductChange};
use emporium_core::sale::{NewSale, Sale, SalesSummary};
use emporium_core::{CategoryId, Page, ProductId, SaleId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::query::{ProductListQuery, SaleListQuery};

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

/// Embedded catalog migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending catalog migrations.
///
/// # Errors
///
/// Returns the migration error if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Everything the catalog services need from storage.
///
/// Lookups that take `include_deleted` return soft-deleted rows only when it
/// is `true`. Multi-row writes ([`Self::update_product`] with a price change,
/// [`Self::complete_sale`]) are all-or-nothing.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError>;

    async fn get_category(
        &self,
        id: CategoryId,
        include_deleted: bool,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Live category with this name, compared case-insensitively.
    async fn find_category_by_name(&self, name: &str)
    -> Result<Option<Category>, RepositoryError>;

    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError>;

    /// Live categories with their live product counts, ordered by name.
    async fn list_categories(&self) -> Result<Vec<CategorySummary>, RepositoryError>;

    /// Number of live products in the category.
    async fn count_products_in_category(&self, id: CategoryId) -> Result<u64, RepositoryError>;

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    async fn get_product(
        &self,
        id: ProductId,
        include_deleted: bool,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Product with this SKU, compared case-insensitively, deleted or not.
    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError>;

    /// Persist a product, appending the price change in the same unit of work.
    async fn update_product(
        &self,
        product: &Product,
        price_change: Option<&NewPriceHistory>,
    ) -> Result<(), RepositoryError>;

    async fn list_products(&self, query: &ProductListQuery)
    -> Result<Page<Product>, RepositoryError>;

    /// Active products with stock at or below `threshold`, lowest first.
    async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError>;

    /// Whether any sale line references the product.
    async fn product_has_sales(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Price changes for a product, newest first.
    async fn price_history(&self, id: ProductId) -> Result<Vec<PriceHistory>, RepositoryError>;

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    async fn insert_sale(&self, sale: NewSale) -> Result<Sale, RepositoryError>;

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError>;

    /// Persist header, items and payment of a sale.
    async fn update_sale(&self, sale: &Sale) -> Result<(), RepositoryError>;

    /// Persist a completed sale together with the products it destocked.
    async fn complete_sale(
        &self,
        sale: &Sale,
        changes: &[ProductChange],
    ) -> Result<(), RepositoryError>;

    async fn list_sales(&self, query: &SaleListQuery) -> Result<Page<Sale>, RepositoryError>;

    /// Count and revenue per sale status.
    async fn sales_summary(&self) -> Result<SalesSummary, RepositoryError>;

    /// Completed sales dated at or after `since`, with category names and
    /// customer location, for the analytics reporter.
    async fn completed_sales_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, RepositoryError>;
}
