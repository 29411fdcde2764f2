//! Emporium catalog services.
//!
//! Wires the pure rules in `emporium-core` to storage and caching:
//!
//! - [`db`] - the [`db::CatalogStore`] boundary with `PostgreSQL` and
//!   in-memory implementations
//! - [`cache`] - the product list cache and its invalidation policy
//! - [`services`] - product, category, sale and analytics operations
//! - [`audit`] - structured audit events for every mutation
//! - [`telemetry`] - tracing and Sentry setup shared by binaries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audit;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod services;
pub mod telemetry;

pub use cache::{CacheProvider, MokaCacheProvider};
pub use config::{CatalogConfig, ConfigError};
pub use db::{CatalogStore, MemoryCatalogStore, PgCatalogStore, RepositoryError};
pub use error::CatalogError;
pub use query::{ProductListQuery, SaleListQuery};
pub use services::{
    AnalyticsService, Catalog, CategoryService, NewSaleRequest, ProductService, SaleService,
    SavedProduct,
};
