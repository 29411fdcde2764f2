//! Products and their governed lifecycle.
//!
//! A [`Product`] can only be produced by the governance pipeline: creating,
//! updating, restocking, deleting or restoring one always re-runs scoring and
//! compliance, so `listing_quality_score` and `status` never drift from the
//! listing content.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, check_len};
use crate::governance::workflow::{self, Evaluation, StatusIntent};
use crate::governance::{ComplianceViolation, Dimensions, ListingScore};
use crate::price_history::NewPriceHistory;
use crate::types::{
    BoundsCheck, CategoryId, Lifecycle, MONEY_MAX, PriceBounds, ProductId, ProductStatus,
};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const SKU_MIN_CHARS: usize = 3;
pub const SKU_MAX_CHARS: usize = 50;
pub const IDENTIFIER_MAX_CHARS: usize = 20;
pub const INVENTORY_LOCATION_MAX_CHARS: usize = 100;

/// Global trade identifiers. Any one of them is enough for the quality score.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductIdentifiers {
    pub upc: Option<String>,
    pub gtin: Option<String>,
    pub isbn: Option<String>,
}

impl ProductIdentifiers {
    fn validate(&self) -> Result<(), DomainError> {
        check_len("upc", self.upc.as_deref(), IDENTIFIER_MAX_CHARS)?;
        check_len("gtin", self.gtin.as_deref(), IDENTIFIER_MAX_CHARS)?;
        check_len("isbn", self.isbn.as_deref(), IDENTIFIER_MAX_CHARS)
    }
}

/// The operator-editable part of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    pub dimensions: Dimensions,
    pub is_hazmat: bool,
    pub safety_data_sheet_url: Option<String>,
    pub price_bounds: PriceBounds,
    pub key_features: Option<String>,
    pub identifiers: ProductIdentifiers,
    pub inventory_location: Option<String>,
}

impl ProductDetails {
    /// Field-level validation.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        let name_len = self.name.trim().chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_len) {
            return Err(invalid(format!(
                "name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
            )));
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_CHARS)
        {
            return Err(invalid(format!(
                "description cannot exceed {DESCRIPTION_MAX_CHARS} characters"
            )));
        }
        let sku_len = self.sku.trim().chars().count();
        if !(SKU_MIN_CHARS..=SKU_MAX_CHARS).contains(&sku_len) {
            return Err(invalid(format!(
                "sku must be between {SKU_MIN_CHARS} and {SKU_MAX_CHARS} characters"
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(invalid("price must be greater than 0"));
        }
        if self.price > MONEY_MAX {
            return Err(invalid(format!("price cannot exceed {MONEY_MAX}")));
        }
        if self.stock_quantity < 0 {
            return Err(invalid("stock quantity cannot be negative"));
        }
        if !self.dimensions.is_valid() {
            return Err(invalid("weight and dimensions must be finite and non-negative"));
        }
        if !self.price_bounds.is_consistent() {
            return Err(invalid(format!(
                "price floor and ceiling must be between 0 and {MONEY_MAX} and floor must not exceed ceiling"
            )));
        }
        self.identifiers.validate()?;
        check_len(
            "inventory location",
            self.inventory_location.as_deref(),
            INVENTORY_LOCATION_MAX_CHARS,
        )
    }
}

fn invalid(message: impl Into<String>) -> DomainError {
    DomainError::Validation(message.into())
}

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    details: ProductDetails,
    listing_quality_score: ListingScore,
    status: ProductStatus,
    lifecycle: Lifecycle,
}

/// A validated, evaluated product that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub details: ProductDetails,
    pub listing_quality_score: ListingScore,
    pub status: ProductStatus,
    pub violation: Option<ComplianceViolation>,
    pub lifecycle: Lifecycle,
}

impl NewProduct {
    /// Validate and run the listing through the pipeline. New products always
    /// start in draft; compliance may block them immediately.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for invalid details.
    pub fn evaluate(details: ProductDetails, now: DateTime<Utc>) -> Result<Self, DomainError> {
        details.validate()?;
        let eval = workflow::evaluate_new(&details);
        Ok(Self {
            details,
            listing_quality_score: eval.score,
            status: eval.status,
            violation: eval.violation,
            lifecycle: Lifecycle::new(now),
        })
    }

    /// Attach the id the store assigned.
    #[must_use]
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            details: self.details,
            listing_quality_score: self.listing_quality_score,
            status: self.status,
            lifecycle: self.lifecycle,
        }
    }
}

/// A full replacement of the editable fields plus the operator's status
/// request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub details: ProductDetails,
    pub intent: StatusIntent,
}

impl ProductUpdate {
    /// Update from an `is_active` toggle.
    #[must_use]
    pub fn new(details: ProductDetails, is_active: bool) -> Self {
        Self {
            details,
            intent: StatusIntent::from(is_active),
        }
    }
}

/// Result of a product mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChange {
    pub product: Product,
    /// Set when the price changed; must be persisted with the product.
    pub price_change: Option<NewPriceHistory>,
    /// Compliance rule that blocked the listing on this save, if any.
    pub violation: Option<ComplianceViolation>,
}

impl Product {
    /// Rebuild a product from storage. The score is recomputed from the
    /// stored fields; the status is state and is taken as stored.
    #[must_use]
    pub fn from_stored(
        id: ProductId,
        details: ProductDetails,
        status: ProductStatus,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            id,
            listing_quality_score: crate::governance::quality::score(&details),
            details,
            status,
            lifecycle,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.id
    }

    #[must_use]
    pub const fn details(&self) -> &ProductDetails {
        &self.details
    }

    #[must_use]
    pub const fn listing_quality_score(&self) -> ListingScore {
        self.listing_quality_score
    }

    #[must_use]
    pub const fn status(&self) -> ProductStatus {
        self.status
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.details.name
    }

    #[must_use]
    pub fn sku(&self) -> &str {
        &self.details.sku
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.details.price
    }

    #[must_use]
    pub const fn stock_quantity(&self) -> i32 {
        self.details.stock_quantity
    }

    #[must_use]
    pub const fn category_id(&self) -> CategoryId {
        self.details.category_id
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    /// Sellable: active and not deleted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active && !self.is_deleted()
    }

    /// Check the current price against the product's own bounds.
    #[must_use]
    pub fn price_bounds_check(&self) -> BoundsCheck {
        self.details.price_bounds.check(self.details.price)
    }

    /// Replace the editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for invalid details.
    pub fn apply_update(
        &self,
        update: ProductUpdate,
        now: DateTime<Utc>,
    ) -> Result<ProductChange, DomainError> {
        update.details.validate()?;
        let price_change = (update.details.price != self.details.price).then(|| {
            NewPriceHistory::new(self.id, self.details.price, update.details.price, now)
        });
        Ok(self.reevaluated(update.details, update.intent, price_change, now))
    }

    /// Set the stock level.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for a negative quantity.
    pub fn with_stock(&self, quantity: i32, now: DateTime<Utc>) -> Result<ProductChange, DomainError> {
        if quantity < 0 {
            return Err(invalid("stock quantity cannot be negative"));
        }
        let details = ProductDetails {
            stock_quantity: quantity,
            ..self.details.clone()
        };
        Ok(self.reevaluated(details, StatusIntent::Keep, None, now))
    }

    /// Take `quantity` units out of stock.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveQuantity`] or
    /// [`DomainError::InsufficientStock`].
    pub fn reduce_stock(&self, quantity: i32, now: DateTime<Utc>) -> Result<ProductChange, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::NonPositiveQuantity(quantity));
        }
        if self.details.stock_quantity < quantity {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                requested: quantity,
                available: self.details.stock_quantity,
            });
        }
        let details = ProductDetails {
            stock_quantity: self.details.stock_quantity - quantity,
            ..self.details.clone()
        };
        Ok(self.reevaluated(details, StatusIntent::Keep, None, now))
    }

    #[must_use]
    pub fn soft_deleted(&self, now: DateTime<Utc>) -> ProductChange {
        let mut change = self.reevaluated(self.details.clone(), StatusIntent::Keep, None, now);
        change.product.lifecycle = self.lifecycle.soft_deleted(now);
        change
    }

    #[must_use]
    pub fn restored(&self, now: DateTime<Utc>) -> ProductChange {
        let mut change = self.reevaluated(self.details.clone(), StatusIntent::Keep, None, now);
        change.product.lifecycle = self.lifecycle.restored(now);
        change
    }

    fn reevaluated(
        &self,
        details: ProductDetails,
        intent: StatusIntent,
        price_change: Option<NewPriceHistory>,
        now: DateTime<Utc>,
    ) -> ProductChange {
        let Evaluation {
            score,
            status,
            violation,
        } = workflow::evaluate(&details, self.status, intent);
        ProductChange {
            product: Self {
                id: self.id,
                details,
                listing_quality_score: score,
                status,
                lifecycle: self.lifecycle.touched(now),
            },
            price_change,
            violation,
        }
    }
}
