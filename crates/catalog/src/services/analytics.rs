use std::sync::Arc;

use chrono::{Duration, Utc};
use emporium_core::analytics::{TrendReport, WINDOW_DAYS};
use tracing::instrument;

use crate::db::CatalogStore;
use crate::error::CatalogError;

/// Builds the trend report from the last [`WINDOW_DAYS`] days of completed
/// sales.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn CatalogStore>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn trend_report(&self) -> Result<TrendReport, CatalogError> {
        let now = Utc::now();
        let sales = self
            .store
            .completed_sales_since(now - Duration::days(WINDOW_DAYS))
            .await?;
        tracing::debug!(sales = sales.len(), "Generating trend report");
        Ok(TrendReport::generate(&sales, now))
    }
}
