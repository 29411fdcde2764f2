//! Sale lifecycle.
//!
//! ```text
//!   create ──► Pending ──complete──► Completed ──refund──► Refunded
//!                 │
//!                 └────cancel────► Cancelled
//! ```
//!
//! Completion is the only transition that touches stock; the sale and the
//! destocked products are written in one unit of work.

use std::sync::Arc;

use chrono::Utc;
use emporium_core::product::Product;
use emporium_core::sale::{NewPayment, NewSale, Sale, SaleDetails, SalesSummary, sale_number};
use emporium_core::{Page, ProductId, SaleId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::invalidate_product_lists;
use crate::audit::{self, AuditAction, AuditEntity};
use crate::cache::CacheProvider;
use crate::db::{CatalogStore, RepositoryError};
use crate::error::CatalogError;
use crate::query::SaleListQuery;

/// Attempts at drawing an unused sale number.
const SALE_NUMBER_ATTEMPTS: usize = 3;

/// Header fields plus the lines of a new sale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewSaleRequest {
    pub details: SaleDetails,
    /// Product and quantity per line. Repeated products are merged.
    pub items: Vec<(ProductId, i32)>,
}

#[derive(Clone)]
pub struct SaleService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheProvider>,
}

impl SaleService {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, cache: Arc<dyn CacheProvider>) -> Self {
        Self { store, cache }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &SaleListQuery) -> Result<Page<Sale>, CatalogError> {
        Ok(self.store.list_sales(query).await?)
    }

    /// # Errors
    ///
    /// `NotFound` for unknown sales.
    #[instrument(skip(self), fields(sale_id = %id))]
    pub async fn get(&self, id: SaleId) -> Result<Sale, CatalogError> {
        self.store
            .get_sale(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("sale", id))
    }

    /// Create a pending sale. Lines snapshot the product's current name and
    /// price; stock is untouched until completion.
    ///
    /// # Errors
    ///
    /// - `Validation` without items, with non-positive quantities or invalid
    ///   customer details
    /// - `NotFound` when a product is unknown or deleted
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create(&self, request: NewSaleRequest) -> Result<Sale, CatalogError> {
        if request.items.is_empty() {
            return Err(CatalogError::Validation(
                "a sale needs at least one item".to_string(),
            ));
        }

        let now = Utc::now();
        let mut draft = NewSale::new(String::new(), request.details, now)?;
        for (product_id, quantity) in request.items {
            let product = self.product(product_id).await?;
            draft.add_item(&product, quantity)?;
        }

        let mut attempt = 0;
        let sale = loop {
            attempt += 1;
            let suffix = rand::rng().random_range(0..10_000u16);
            let new = NewSale {
                sale_number: sale_number(now, suffix),
                ..draft.clone()
            };
            match self.store.insert_sale(new).await {
                Err(RepositoryError::Conflict(_)) if attempt < SALE_NUMBER_ATTEMPTS => {
                    tracing::debug!(attempt, "Sale number taken, drawing another");
                }
                result => break result?,
            }
        };

        audit::record(
            AuditEntity::Sale,
            sale.id.as_i32(),
            AuditAction::Created,
            Some(sale.sale_number.as_str()),
        );
        tracing::info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            final_amount = %sale.final_amount(),
            "Sale created"
        );
        Ok(sale)
    }

    /// Replace customer, notes, tax and discount of a pending sale.
    ///
    /// # Errors
    ///
    /// `Conflict` unless pending, `Validation` for invalid details.
    #[instrument(skip(self, details), fields(sale_id = %id))]
    pub async fn update(&self, id: SaleId, details: SaleDetails) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;
        sale.update_details(details, Utc::now())?;
        self.save(&sale, AuditAction::Updated, None).await?;
        Ok(sale)
    }

    /// Add a line to a pending sale, merging with an existing line.
    ///
    /// # Errors
    ///
    /// `Conflict` unless pending, `NotFound` for unknown products.
    #[instrument(skip(self), fields(sale_id = %id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        id: SaleId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;
        let product = self.product(product_id).await?;
        sale.add_item(&product, quantity, Utc::now())?;
        self.save(&sale, AuditAction::Updated, None).await?;
        Ok(sale)
    }

    /// Complete a pending sale and take every line out of stock.
    ///
    /// # Errors
    ///
    /// `Conflict` unless pending or when stock is short; nothing is written
    /// in either case.
    #[instrument(skip(self), fields(sale_id = %id))]
    pub async fn complete(&self, id: SaleId) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;

        let mut products: Vec<Product> = Vec::with_capacity(sale.lines.items().len());
        for item in sale.lines.items() {
            if let Some(product) = self.store.get_product(item.product_id, true).await? {
                products.push(product);
            }
        }

        let changes = sale.complete(&products, Utc::now())?;
        self.store.complete_sale(&sale, &changes).await?;
        invalidate_product_lists(self.cache.as_ref()).await;

        for change in &changes {
            tracing::debug!(
                product_id = %change.product.id(),
                stock = change.product.stock_quantity(),
                "Stock reduced by sale"
            );
        }
        audit::record(
            AuditEntity::Sale,
            id.as_i32(),
            AuditAction::Completed,
            Some(sale.sale_number.as_str()),
        );
        Ok(sale)
    }

    /// # Errors
    ///
    /// `Conflict` for completed or refunded sales.
    #[instrument(skip(self), fields(sale_id = %id))]
    pub async fn cancel(&self, id: SaleId) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;
        sale.cancel(Utc::now())?;
        self.save(&sale, AuditAction::Cancelled, None).await?;
        Ok(sale)
    }

    /// Refund a completed sale. Stock is not returned.
    ///
    /// # Errors
    ///
    /// `Conflict` unless completed.
    #[instrument(skip(self), fields(sale_id = %id))]
    pub async fn refund(&self, id: SaleId) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;
        sale.refund(Utc::now())?;
        self.save(&sale, AuditAction::Refunded, None).await?;
        Ok(sale)
    }

    /// Record the sale's payment. A sale carries at most one.
    ///
    /// # Errors
    ///
    /// `Conflict` when a payment exists, `Validation` for a bad amount.
    #[instrument(skip(self, payment), fields(sale_id = %id, method = %payment.method))]
    pub async fn add_payment(&self, id: SaleId, payment: NewPayment) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;
        sale.attach_payment(payment, Utc::now())?;
        self.save(&sale, AuditAction::PaymentRecorded, None).await?;
        Ok(sale)
    }

    /// # Errors
    ///
    /// `Conflict` when the sale has no payment.
    #[instrument(skip(self), fields(sale_id = %id))]
    pub async fn mark_payment_processed(
        &self,
        id: SaleId,
        transaction_id: Option<String>,
    ) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;
        sale.mark_payment_processed(transaction_id, Utc::now())?;
        let detail = sale
            .payment
            .as_ref()
            .and_then(|p| p.transaction_id.clone());
        self.save(&sale, AuditAction::PaymentProcessed, detail.as_deref())
            .await?;
        Ok(sale)
    }

    /// # Errors
    ///
    /// `Conflict` when the sale has no payment.
    #[instrument(skip(self), fields(sale_id = %id))]
    pub async fn mark_payment_failed(
        &self,
        id: SaleId,
        reason: Option<String>,
    ) -> Result<Sale, CatalogError> {
        let mut sale = self.get(id).await?;
        sale.mark_payment_failed(reason.clone(), Utc::now())?;
        self.save(&sale, AuditAction::PaymentFailed, reason.as_deref())
            .await?;
        tracing::warn!(sale_id = %id, "Payment failed");
        Ok(sale)
    }

    /// Count and revenue per status.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<SalesSummary, CatalogError> {
        Ok(self.store.sales_summary().await?)
    }

    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .get_product(id, false)
            .await?
            .ok_or_else(|| CatalogError::not_found("product", id))
    }

    async fn save(
        &self,
        sale: &Sale,
        action: AuditAction,
        detail: Option<&str>,
    ) -> Result<(), CatalogError> {
        self.store.update_sale(sale).await?;
        audit::record(AuditEntity::Sale, sale.id.as_i32(), action, detail);
        Ok(())
    }
}
