//! Catalog services.
//!
//! Each service owns shared handles to the store and cache, so cloning one is
//! cheap. [`Catalog`] wires them all from a [`CatalogConfig`].

pub mod analytics;
pub mod categories;
pub mod products;
pub mod sales;

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheProvider, PRODUCT_LIST_PREFIX};
use crate::config::CatalogConfig;
use crate::db::CatalogStore;

pub use analytics::AnalyticsService;
pub use categories::CategoryService;
pub use products::{ProductService, SavedProduct};
pub use sales::{NewSaleRequest, SaleService};

/// Product policy knobs taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSettings {
    pub cache_ttl: Duration,
    pub low_stock_threshold: i32,
    pub enforce_price_bounds: bool,
}

impl From<&CatalogConfig> for ProductSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            cache_ttl: config.product_cache_ttl,
            low_stock_threshold: config.low_stock_threshold,
            enforce_price_bounds: config.enforce_price_bounds,
        }
    }
}

impl Default for ProductSettings {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

/// Drop every cached product list page.
pub(crate) async fn invalidate_product_lists(cache: &dyn CacheProvider) {
    cache.remove_by_prefix(PRODUCT_LIST_PREFIX).await;
}

/// All services over one store and cache.
#[derive(Clone)]
pub struct Catalog {
    pub products: ProductService,
    pub categories: CategoryService,
    pub sales: SaleService,
    pub analytics: AnalyticsService,
}

impl Catalog {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheProvider>,
        config: &CatalogConfig,
    ) -> Self {
        Self {
            products: ProductService::new(
                Arc::clone(&store),
                Arc::clone(&cache),
                ProductSettings::from(config),
            ),
            categories: CategoryService::new(Arc::clone(&store)),
            sales: SaleService::new(Arc::clone(&store), cache),
            analytics: AnalyticsService::new(store),
        }
    }
}
