//! Integration tests for Emporium.
//!
//! Scenarios run the real services over [`MemoryCatalogStore`] and the moka
//! cache, so they need no database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `governance` - scoring, compliance and status workflow through the services
//! - `catalog` - categories, soft deletes and the product list cache
//! - `sales` - sale lifecycle, stock and analytics

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use emporium_catalog::{
    CacheProvider, Catalog, CatalogConfig, CatalogStore, MemoryCatalogStore, MokaCacheProvider,
};
use emporium_core::category::CategoryDetails;
use emporium_core::governance::Dimensions;
use emporium_core::product::{ProductDetails, ProductIdentifiers};
use emporium_core::{CategoryId, PriceBounds};
use rust_decimal::Decimal;

/// Services plus direct handles on their store and cache.
pub struct TestContext {
    pub catalog: Catalog,
    pub store: Arc<MemoryCatalogStore>,
    pub cache: Arc<MokaCacheProvider>,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CatalogConfig::default())
    }

    #[must_use]
    pub fn with_config(config: &CatalogConfig) -> Self {
        let store = Arc::new(MemoryCatalogStore::new());
        let cache = Arc::new(MokaCacheProvider::new(config.product_cache_capacity));
        let catalog = Catalog::new(
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            Arc::clone(&cache) as Arc<dyn CacheProvider>,
            config,
        );
        Self {
            catalog,
            store,
            cache,
        }
    }

    /// Create a category and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the category cannot be created.
    #[allow(clippy::unwrap_used)]
    pub async fn category(&self, name: &str) -> CategoryId {
        self.catalog
            .categories
            .create(CategoryDetails::new(name, None))
            .await
            .unwrap()
            .id
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A minimal valid listing: short name, no description or image, so it
/// scores zero.
#[must_use]
pub fn listing(name: &str, sku: &str, price: Decimal, category_id: CategoryId) -> ProductDetails {
    ProductDetails {
        name: name.to_string(),
        description: None,
        price,
        sku: sku.to_string(),
        stock_quantity: 10,
        image_url: None,
        category_id,
        dimensions: Dimensions::default(),
        is_hazmat: false,
        safety_data_sheet_url: None,
        price_bounds: PriceBounds::default(),
        key_features: None,
        identifiers: ProductIdentifiers::default(),
        inventory_location: None,
    }
}
