//! Product operations.
//!
//! Every save goes through the governance pipeline in `emporium-core`, then
//! drops the cached product lists and writes an audit event.

use std::sync::Arc;

use chrono::Utc;
use emporium_core::governance::{self, ComplianceViolation};
use emporium_core::price_history::PriceHistory;
use emporium_core::product::{NewProduct, Product, ProductChange, ProductDetails, ProductUpdate};
use emporium_core::{BoundsCheck, CategoryId, Page, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::{ProductSettings, invalidate_product_lists};
use crate::audit::{self, AuditAction, AuditEntity};
use crate::cache::{self, CacheProvider};
use crate::db::CatalogStore;
use crate::error::CatalogError;
use crate::query::ProductListQuery;

/// A stored product plus what governance and pricing said about the save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedProduct {
    pub product: Product,
    /// Compliance rule that blocked the listing, if any.
    pub violation: Option<ComplianceViolation>,
    pub price_bounds: BoundsCheck,
}

impl SavedProduct {
    fn from_change(change: ProductChange) -> Self {
        Self {
            price_bounds: change.product.price_bounds_check(),
            product: change.product,
            violation: change.violation,
        }
    }
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheProvider>,
    settings: ProductSettings,
}

impl ProductService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheProvider>,
        settings: ProductSettings,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    /// One page of live products, served from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ProductListQuery) -> Result<Page<Product>, CatalogError> {
        let key = query.cache_key();
        if let Some(page) = cache::get_json::<Page<Product>>(self.cache.as_ref(), &key).await {
            tracing::debug!(key = %key, "Product list cache hit");
            return Ok(page);
        }

        let page = self.store.list_products(query).await?;
        cache::set_json(self.cache.as_ref(), &key, &page, self.settings.cache_ttl).await;
        Ok(page)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown or deleted products.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .get_product(id, false)
            .await?
            .ok_or_else(|| CatalogError::not_found("product", id))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when no live product has the SKU.
    #[instrument(skip(self))]
    pub async fn get_by_sku(&self, sku: &str) -> Result<Product, CatalogError> {
        self.store
            .find_product_by_sku(sku)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| CatalogError::not_found("product with sku", sku.trim()))
    }

    /// Create a product. It starts in draft unless compliance blocks it.
    ///
    /// # Errors
    ///
    /// - `Validation` for invalid fields or an out-of-bounds price when
    ///   enforcement is on
    /// - `Conflict` when the SKU is taken (case-insensitive)
    /// - `NotFound` when the category does not exist
    #[instrument(skip(self, details), fields(sku = %details.sku))]
    pub async fn create(&self, details: ProductDetails) -> Result<SavedProduct, CatalogError> {
        let new = NewProduct::evaluate(details, Utc::now())?;
        self.ensure_sku_available(&new.details.sku, None).await?;
        self.ensure_category(new.details.category_id).await?;
        self.check_price_bounds(&new.details)?;

        let violation = new.violation;
        let product = self.store.insert_product(new).await?;
        invalidate_product_lists(self.cache.as_ref()).await;

        audit::record(
            AuditEntity::Product,
            product.id().as_i32(),
            AuditAction::Created,
            violation.map(|v| v.to_string()).as_deref(),
        );
        tracing::info!(
            product_id = %product.id(),
            status = %product.status(),
            score = %product.listing_quality_score(),
            "Product created"
        );

        Ok(SavedProduct::from_change(ProductChange {
            product,
            price_change: None,
            violation,
        }))
    }

    /// Replace a product's editable fields and apply the status request.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`], plus `NotFound` for unknown products.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<SavedProduct, CatalogError> {
        let current = self.get(id).await?;
        if !current.sku().trim().eq_ignore_ascii_case(update.details.sku.trim()) {
            self.ensure_sku_available(&update.details.sku, Some(id))
                .await?;
        }
        if current.category_id() != update.details.category_id {
            self.ensure_category(update.details.category_id).await?;
        }

        let change = current.apply_update(update, Utc::now())?;
        self.check_price_bounds(change.product.details())?;
        self.store
            .update_product(&change.product, change.price_change.as_ref())
            .await?;
        invalidate_product_lists(self.cache.as_ref()).await;

        if let Some(price) = &change.price_change {
            tracing::info!(
                product_id = %id,
                old_price = %price.old_price,
                new_price = %price.new_price,
                "Product price changed"
            );
        }
        audit::record(
            AuditEntity::Product,
            id.as_i32(),
            AuditAction::Updated,
            change.violation.map(|v| v.to_string()).as_deref(),
        );

        Ok(SavedProduct::from_change(change))
    }

    /// Set the stock level.
    ///
    /// # Errors
    ///
    /// `Validation` for negative quantities, `NotFound` for unknown products.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<SavedProduct, CatalogError> {
        let current = self.get(id).await?;
        let change = current.with_stock(quantity, Utc::now())?;
        self.store.update_product(&change.product, None).await?;
        invalidate_product_lists(self.cache.as_ref()).await;

        let detail = format!("{} -> {quantity}", current.stock_quantity());
        audit::record(
            AuditEntity::Product,
            id.as_i32(),
            AuditAction::StockChanged,
            Some(detail.as_str()),
        );
        if quantity <= self.settings.low_stock_threshold {
            tracing::warn!(product_id = %id, quantity, "Product stock is low");
        }

        Ok(SavedProduct::from_change(change))
    }

    /// Soft-delete a product that has never been sold.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown products, `Conflict` when sale lines reference it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        let current = self.get(id).await?;
        if self.store.product_has_sales(id).await? {
            return Err(CatalogError::Conflict(format!(
                "product {id} has sales and cannot be deleted"
            )));
        }

        let change = current.soft_deleted(Utc::now());
        self.store.update_product(&change.product, None).await?;
        invalidate_product_lists(self.cache.as_ref()).await;
        audit::record(AuditEntity::Product, id.as_i32(), AuditAction::Deleted, None);
        Ok(())
    }

    /// Bring back a soft-deleted product.
    ///
    /// # Errors
    ///
    /// `NotFound` unless the product exists and is deleted.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn restore(&self, id: ProductId) -> Result<SavedProduct, CatalogError> {
        let current = self
            .store
            .get_product(id, true)
            .await?
            .filter(Product::is_deleted)
            .ok_or_else(|| CatalogError::not_found("deleted product", id))?;

        let change = current.restored(Utc::now());
        self.store.update_product(&change.product, None).await?;
        invalidate_product_lists(self.cache.as_ref()).await;
        audit::record(AuditEntity::Product, id.as_i32(), AuditAction::Restored, None);
        Ok(SavedProduct::from_change(change))
    }

    /// Price changes, newest first.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown products.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn price_history(&self, id: ProductId) -> Result<Vec<PriceHistory>, CatalogError> {
        self.store
            .get_product(id, true)
            .await?
            .ok_or_else(|| CatalogError::not_found("product", id))?;
        Ok(self.store.price_history(id).await?)
    }

    /// Active products at or below `threshold` (configured default when `None`).
    /// Drafts and blocked listings are not sellable and are left out.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: Option<i32>) -> Result<Vec<Product>, CatalogError> {
        let threshold = threshold.unwrap_or(self.settings.low_stock_threshold);
        Ok(self.store.low_stock_products(threshold).await?)
    }

    /// Fulfillment fee for a product's current weight and dimensions.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown products.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn estimate_fee(&self, id: ProductId) -> Result<Decimal, CatalogError> {
        let product = self.get(id).await?;
        Ok(governance::estimate_fee(&product.details().dimensions))
    }

    async fn ensure_sku_available(
        &self,
        sku: &str,
        owner: Option<ProductId>,
    ) -> Result<(), CatalogError> {
        match self.store.find_product_by_sku(sku).await? {
            Some(existing) if Some(existing.id()) != owner => Err(CatalogError::Conflict(
                format!("sku {} already exists", sku.trim()),
            )),
            _ => Ok(()),
        }
    }

    async fn ensure_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        self.store
            .get_category(id, false)
            .await?
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found("category", id))
    }

    fn check_price_bounds(&self, details: &ProductDetails) -> Result<BoundsCheck, CatalogError> {
        let check = details.price_bounds.check(details.price);
        let message = match check {
            BoundsCheck::WithinBounds => return Ok(check),
            BoundsCheck::BelowFloor { floor } => {
                format!("price {} is below floor {floor}", details.price)
            }
            BoundsCheck::AboveCeiling { ceiling } => {
                format!("price {} is above ceiling {ceiling}", details.price)
            }
        };
        if self.settings.enforce_price_bounds {
            return Err(CatalogError::Validation(message));
        }
        tracing::warn!(sku = %details.sku, "{message}");
        Ok(check)
    }
}
