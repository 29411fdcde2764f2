//! Sales, their line items and payment records.
//!
//! Line items snapshot the product name and unit price at the time they are
//! added, so later catalog edits never rewrite sales history. Totals are
//! recomputed whenever items, tax or discount change:
//!
//! ```text
//! total = Σ quantity × unit_price
//! final = max(0, total + tax − discount)
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, check_len};
use crate::product::{Product, ProductChange};
use crate::types::{
    Lifecycle, MONEY_MAX, PaymentMethod, PaymentStatus, ProductId, SaleId, SaleStatus,
};

pub const CUSTOMER_NAME_MAX_CHARS: usize = 200;
pub const CUSTOMER_EMAIL_MAX_CHARS: usize = 100;
pub const LOCATION_MAX_CHARS: usize = 100;
pub const NOTES_MAX_CHARS: usize = 500;
pub const PAYMENT_REFERENCE_MAX_CHARS: usize = 50;
pub const TRANSACTION_ID_MAX_CHARS: usize = 100;

/// Build a human-readable sale number, e.g. `SALE-20250301-120000-4821`.
#[must_use]
pub fn sale_number(now: DateTime<Utc>, suffix: u16) -> String {
    format!("SALE-{}-{suffix:04}", now.format("%Y%m%d-%H%M%S"))
}

/// Customer contact and location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Customer {
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for overlong fields or a malformed
    /// email address.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_len("customer name", self.name.as_deref(), CUSTOMER_NAME_MAX_CHARS)?;
        check_len("customer email", self.email.as_deref(), CUSTOMER_EMAIL_MAX_CHARS)?;
        check_len("customer city", self.city.as_deref(), LOCATION_MAX_CHARS)?;
        check_len("customer state", self.state.as_deref(), LOCATION_MAX_CHARS)?;
        check_len("customer country", self.country.as_deref(), LOCATION_MAX_CHARS)?;
        if let Some(email) = self.email.as_deref().map(str::trim)
            && !email.is_empty()
            && !looks_like_email(email)
        {
            return Err(DomainError::Validation(format!(
                "invalid customer email: {email}"
            )));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
}

fn check_amount(field: &str, amount: Decimal) -> Result<(), DomainError> {
    if amount < Decimal::ZERO {
        return Err(DomainError::Validation(format!("{field} cannot be negative")));
    }
    check_money(field, amount)
}

fn check_money(field: &str, amount: Decimal) -> Result<(), DomainError> {
    if amount > MONEY_MAX {
        return Err(DomainError::Validation(format!("{field} cannot exceed {MONEY_MAX}")));
    }
    Ok(())
}

/// One product line on a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl SaleItem {
    fn new(product: &Product, quantity: i32) -> Result<Self, DomainError> {
        Ok(Self {
            product_id: product.id(),
            product_name: product.name().to_string(),
            quantity,
            unit_price: product.price(),
            line_total: line_total(product.price(), quantity)?,
        })
    }
}

fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, DomainError> {
    let total = unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| DomainError::Validation("line total is too large".to_string()))?;
    check_money("line total", total)?;
    Ok(total)
}

/// Line items and the amounts derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleLines {
    items: Vec<SaleItem>,
    tax_amount: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    final_amount: Decimal,
}

impl SaleLines {
    /// Rebuild from stored items; amounts are recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for negative tax or discount, or
    /// amounts above [`MONEY_MAX`].
    pub fn from_stored(
        items: Vec<SaleItem>,
        tax_amount: Decimal,
        discount_amount: Decimal,
    ) -> Result<Self, DomainError> {
        let mut lines = Self {
            items,
            ..Self::default()
        };
        lines.set_adjustments(tax_amount, discount_amount)?;
        Ok(lines)
    }

    #[must_use]
    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    #[must_use]
    pub const fn tax_amount(&self) -> Decimal {
        self.tax_amount
    }

    #[must_use]
    pub const fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    #[must_use]
    pub const fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    #[must_use]
    pub const fn final_amount(&self) -> Decimal {
        self.final_amount
    }

    /// Lines are left untouched when the merged quantity or any amount
    /// would not fit.
    fn add(&mut self, product: &Product, quantity: i32) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::NonPositiveQuantity(quantity));
        }
        let mut items = self.items.clone();
        match items.iter_mut().find(|item| item.product_id == product.id()) {
            Some(item) => {
                item.quantity = item.quantity.checked_add(quantity).ok_or_else(|| {
                    DomainError::Validation(format!(
                        "quantity of {} cannot exceed {}",
                        item.product_name,
                        i32::MAX
                    ))
                })?;
                item.line_total = line_total(item.unit_price, item.quantity)?;
            }
            None => items.push(SaleItem::new(product, quantity)?),
        }
        self.apply(items, self.tax_amount, self.discount_amount)
    }

    fn set_adjustments(&mut self, tax: Decimal, discount: Decimal) -> Result<(), DomainError> {
        check_amount("tax amount", tax)?;
        check_amount("discount amount", discount)?;
        self.apply(self.items.clone(), tax, discount)
    }

    fn apply(
        &mut self,
        items: Vec<SaleItem>,
        tax: Decimal,
        discount: Decimal,
    ) -> Result<(), DomainError> {
        let total = items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total))
            .filter(|total| *total <= MONEY_MAX)
            .ok_or_else(|| {
                DomainError::Validation(format!("sale total cannot exceed {MONEY_MAX}"))
            })?;
        let gross = total + tax;
        check_money("sale total with tax", gross)?;
        self.items = items;
        self.tax_amount = tax;
        self.discount_amount = discount;
        self.total_amount = total;
        self.final_amount = (gross - discount).max(Decimal::ZERO);
        Ok(())
    }
}

/// Editable header fields of a pending sale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleDetails {
    pub customer: Customer,
    pub notes: Option<String>,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
}

impl SaleDetails {
    fn validate(&self) -> Result<(), DomainError> {
        self.customer.validate()?;
        check_len("notes", self.notes.as_deref(), NOTES_MAX_CHARS)
    }
}

/// Payment details supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

/// The payment recorded against a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_reference: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub lifecycle: Lifecycle,
}

impl PaymentInfo {
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for a non-positive amount or
    /// overlong text.
    pub fn new(payment: NewPayment, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if payment.amount <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "payment amount must be greater than 0".to_string(),
            ));
        }
        check_len(
            "payment reference",
            payment.payment_reference.as_deref(),
            PAYMENT_REFERENCE_MAX_CHARS,
        )?;
        check_len("payment notes", payment.notes.as_deref(), NOTES_MAX_CHARS)?;
        check_money("payment amount", payment.amount)?;
        Ok(Self {
            method: payment.method,
            amount: payment.amount,
            status: PaymentStatus::Pending,
            transaction_id: None,
            payment_reference: payment.payment_reference,
            processed_at: None,
            notes: payment.notes,
            lifecycle: Lifecycle::new(now),
        })
    }

    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for an overlong transaction id.
    pub fn processed(
        self,
        transaction_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        check_len(
            "transaction id",
            transaction_id.as_deref(),
            TRANSACTION_ID_MAX_CHARS,
        )?;
        Ok(Self {
            status: PaymentStatus::Completed,
            transaction_id,
            processed_at: Some(now),
            lifecycle: self.lifecycle.touched(now),
            ..self
        })
    }

    /// The reason replaces the payment notes.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for an overlong reason.
    pub fn failed(self, reason: Option<String>, now: DateTime<Utc>) -> Result<Self, DomainError> {
        check_len("failure reason", reason.as_deref(), NOTES_MAX_CHARS)?;
        Ok(Self {
            status: PaymentStatus::Failed,
            notes: reason,
            lifecycle: self.lifecycle.touched(now),
            ..self
        })
    }

    #[must_use]
    pub fn refunded(self, now: DateTime<Utc>) -> Self {
        Self {
            status: PaymentStatus::Refunded,
            lifecycle: self.lifecycle.touched(now),
            ..self
        }
    }
}

/// A sale that has not been stored yet. Always pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub details: SaleDetails,
    pub lines: SaleLines,
    pub lifecycle: Lifecycle,
}

impl NewSale {
    /// Start a pending sale with no items.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for invalid details.
    pub fn new(
        sale_number: String,
        details: SaleDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        details.validate()?;
        let mut lines = SaleLines::default();
        lines.set_adjustments(details.tax_amount, details.discount_amount)?;
        Ok(Self {
            sale_number,
            sale_date: now,
            details,
            lines,
            lifecycle: Lifecycle::new(now),
        })
    }

    /// Add `quantity` of `product`, merging with an existing line for the
    /// same product.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveQuantity`], or
    /// [`DomainError::Validation`] when the merged quantity or an amount
    /// would overflow.
    pub fn add_item(&mut self, product: &Product, quantity: i32) -> Result<(), DomainError> {
        self.lines.add(product, quantity)
    }

    #[must_use]
    pub fn with_id(self, id: SaleId) -> Sale {
        Sale {
            id,
            sale_number: self.sale_number,
            sale_date: self.sale_date,
            status: SaleStatus::Pending,
            details: self.details,
            lines: self.lines,
            payment: None,
            lifecycle: self.lifecycle,
        }
    }
}

/// A stored sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub status: SaleStatus,
    pub details: SaleDetails,
    pub lines: SaleLines,
    pub payment: Option<PaymentInfo>,
    pub lifecycle: Lifecycle,
}

impl Sale {
    fn ensure(&self, allowed: bool, action: &'static str) -> Result<(), DomainError> {
        if allowed {
            Ok(())
        } else {
            Err(DomainError::InvalidSaleTransition {
                status: self.status,
                action,
            })
        }
    }

    /// # Errors
    ///
    /// Fails unless the sale is pending.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure(self.status == SaleStatus::Pending, "modify")?;
        self.lines.add(product, quantity)?;
        self.lifecycle = self.lifecycle.touched(now);
        Ok(())
    }

    /// Replace customer, notes, tax and discount.
    ///
    /// # Errors
    ///
    /// Fails unless the sale is pending, or on invalid details.
    pub fn update_details(&mut self, details: SaleDetails, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure(self.status == SaleStatus::Pending, "modify")?;
        details.validate()?;
        self.lines
            .set_adjustments(details.tax_amount, details.discount_amount)?;
        self.details = details;
        self.lifecycle = self.lifecycle.touched(now);
        Ok(())
    }

    /// Complete a pending sale, taking every line out of stock.
    ///
    /// `products` must contain the current state of every product on the
    /// sale. Returns the restocked products to persist with the sale. Nothing
    /// changes if any line cannot be fulfilled.
    ///
    /// # Errors
    ///
    /// Fails unless the sale is pending, when a product is missing, or when
    /// stock is insufficient.
    pub fn complete(
        &mut self,
        products: &[Product],
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductChange>, DomainError> {
        self.ensure(self.status == SaleStatus::Pending, "complete")?;
        if self.lines.items.is_empty() {
            return Err(DomainError::Validation(
                "cannot complete a sale without items".to_string(),
            ));
        }
        let changes = self
            .lines
            .items
            .iter()
            .map(|item| {
                products
                    .iter()
                    .find(|p| p.id() == item.product_id)
                    .ok_or(DomainError::ProductMissing(item.product_id))?
                    .reduce_stock(item.quantity, now)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.status = SaleStatus::Completed;
        self.lifecycle = self.lifecycle.touched(now);
        Ok(changes)
    }

    /// # Errors
    ///
    /// Completed and refunded sales cannot be cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure(
            !matches!(self.status, SaleStatus::Completed | SaleStatus::Refunded),
            "cancel",
        )?;
        self.status = SaleStatus::Cancelled;
        self.lifecycle = self.lifecycle.touched(now);
        Ok(())
    }

    /// Refund a completed sale. A recorded payment is marked refunded.
    ///
    /// # Errors
    ///
    /// Fails unless the sale is completed.
    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure(self.status == SaleStatus::Completed, "refund")?;
        self.status = SaleStatus::Refunded;
        self.payment = self.payment.take().map(|p| p.refunded(now));
        self.lifecycle = self.lifecycle.touched(now);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when a payment is already recorded or the payment is invalid.
    pub fn attach_payment(&mut self, payment: NewPayment, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.payment.is_some() {
            return Err(DomainError::PaymentAlreadyRecorded);
        }
        self.payment = Some(PaymentInfo::new(payment, now)?);
        self.lifecycle = self.lifecycle.touched(now);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when no payment is recorded or the transaction id is too long.
    pub fn mark_payment_processed(
        &mut self,
        transaction_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let payment = self.payment.clone().ok_or(DomainError::PaymentMissing)?;
        self.payment = Some(payment.processed(transaction_id, now)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when no payment is recorded or the reason is too long.
    pub fn mark_payment_failed(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let payment = self.payment.clone().ok_or(DomainError::PaymentMissing)?;
        self.payment = Some(payment.failed(reason, now)?);
        Ok(())
    }

    #[must_use]
    pub const fn final_amount(&self) -> Decimal {
        self.lines.final_amount
    }
}

/// Sale count and revenue for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotal {
    pub status: SaleStatus,
    pub count: u64,
    pub total_amount: Decimal,
}

/// Totals across all sales, broken down by status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub by_status: Vec<StatusTotal>,
}

impl SalesSummary {
    /// Build a summary from per-status totals.
    #[must_use]
    pub fn from_totals(mut by_status: Vec<StatusTotal>) -> Self {
        by_status.sort_by_key(|t| t.status.as_str());
        Self {
            total_sales: by_status.iter().map(|t| t.count).sum(),
            total_revenue: by_status.iter().map(|t| t.total_amount).sum(),
            by_status,
        }
    }

    /// Summarise an in-memory set of sales.
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        let mut totals: Vec<StatusTotal> = Vec::new();
        for sale in sales {
            match totals.iter_mut().find(|t| t.status == sale.status) {
                Some(t) => {
                    t.count += 1;
                    t.total_amount += sale.final_amount();
                }
                None => totals.push(StatusTotal {
                    status: sale.status,
                    count: 1,
                    total_amount: sale.final_amount(),
                }),
            }
        }
        Self::from_totals(totals)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::dec;

    use super::*;
    use crate::product::NewProduct;
    use crate::product::test_support::details;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn product(id: i32, price: Decimal, stock: i32) -> Product {
        let mut d = details(&format!("Product {id}"));
        d.price = price;
        d.stock_quantity = stock;
        NewProduct::evaluate(d, now())
            .unwrap()
            .with_id(ProductId::new(id))
    }

    fn pending(tax: Decimal, discount: Decimal) -> Sale {
        let details = SaleDetails {
            tax_amount: tax,
            discount_amount: discount,
            ..SaleDetails::default()
        };
        NewSale::new(sale_number(now(), 7), details, now())
            .unwrap()
            .with_id(SaleId::new(1))
    }

    #[test]
    fn test_sale_number_format() {
        assert_eq!(sale_number(now(), 42), "SALE-20250301-120000-0042");
    }

    #[test]
    fn test_totals_and_merge() {
        let a = product(1, dec!(10.00), 5);
        let b = product(2, dec!(2.50), 5);
        let mut sale = pending(dec!(1.00), dec!(0.50));
        sale.add_item(&a, 2, now()).unwrap();
        sale.add_item(&b, 1, now()).unwrap();
        sale.add_item(&a, 1, now()).unwrap();

        assert_eq!(sale.lines.items().len(), 2);
        assert_eq!(sale.lines.items()[0].quantity, 3);
        assert_eq!(sale.lines.items()[0].line_total, dec!(30.00));
        assert_eq!(sale.lines.total_amount(), dec!(32.50));
        assert_eq!(sale.final_amount(), dec!(33.00));
    }

    #[test]
    fn test_final_amount_floors_at_zero() {
        let mut sale = pending(Decimal::ZERO, dec!(100));
        sale.add_item(&product(1, dec!(10), 5), 1, now()).unwrap();
        assert_eq!(sale.final_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_adjustments_rejected() {
        let details = SaleDetails {
            tax_amount: dec!(-1),
            ..SaleDetails::default()
        };
        assert!(NewSale::new("S".to_string(), details, now()).is_err());
    }

    #[test]
    fn test_complete_reduces_stock() {
        let a = product(1, dec!(10), 5);
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        sale.add_item(&a, 3, now()).unwrap();

        let changes = sale.complete(&[a.clone()], now()).unwrap();
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(changes[0].product.stock_quantity(), 2);

        let err = sale.add_item(&a, 1, now()).unwrap_err();
        assert_eq!(err.to_string(), "cannot modify a completed sale");
    }

    #[test]
    fn test_complete_with_insufficient_stock_changes_nothing() {
        let a = product(1, dec!(10), 1);
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        sale.add_item(&a, 2, now()).unwrap();
        assert!(matches!(
            sale.complete(&[a], now()),
            Err(DomainError::InsufficientStock { .. })
        ));
        assert_eq!(sale.status, SaleStatus::Pending);
    }

    #[test]
    fn test_complete_missing_product() {
        let a = product(1, dec!(10), 5);
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        sale.add_item(&a, 1, now()).unwrap();
        assert_eq!(
            sale.complete(&[], now()).unwrap_err(),
            DomainError::ProductMissing(ProductId::new(1))
        );
    }

    #[test]
    fn test_cancel_and_refund_transitions() {
        let a = product(1, dec!(10), 5);
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        sale.add_item(&a, 1, now()).unwrap();
        assert!(sale.refund(now()).is_err());

        sale.attach_payment(
            NewPayment {
                method: PaymentMethod::CreditCard,
                amount: dec!(10),
                payment_reference: None,
                notes: None,
            },
            now(),
        )
        .unwrap();
        sale.complete(&[a], now()).unwrap();
        assert!(sale.cancel(now()).is_err());

        sale.refund(now()).unwrap();
        assert_eq!(sale.status, SaleStatus::Refunded);
        assert_eq!(
            sale.payment.as_ref().unwrap().status,
            PaymentStatus::Refunded
        );
        assert!(sale.cancel(now()).is_err());
    }

    #[test]
    fn test_single_payment() {
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        let payment = NewPayment {
            method: PaymentMethod::Cash,
            amount: dec!(5),
            payment_reference: Some("REF-1".to_string()),
            notes: None,
        };
        assert!(matches!(
            sale.mark_payment_processed(None, now()),
            Err(DomainError::PaymentMissing)
        ));
        sale.attach_payment(payment.clone(), now()).unwrap();
        assert_eq!(
            sale.attach_payment(payment, now()).unwrap_err(),
            DomainError::PaymentAlreadyRecorded
        );

        sale.mark_payment_processed(Some("txn_1".to_string()), now())
            .unwrap();
        let info = sale.payment.as_ref().unwrap();
        assert_eq!(info.status, PaymentStatus::Completed);
        assert_eq!(info.processed_at, Some(now()));
    }

    #[test]
    fn test_merging_past_i32_max_is_rejected() {
        let a = product(1, dec!(0.01), 5);
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        sale.add_item(&a, i32::MAX, now()).unwrap();
        let err = sale.add_item(&a, 1, now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(sale.lines.items()[0].quantity, i32::MAX);
        assert_eq!(sale.lines.total_amount(), dec!(21474836.47));
    }

    #[test]
    fn test_totals_beyond_money_column_are_rejected() {
        let a = product(1, MONEY_MAX, 5);
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        sale.add_item(&a, 1, now()).unwrap();
        assert!(matches!(
            sale.add_item(&a, i32::MAX - 1, now()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            sale.add_item(&product(2, dec!(1), 5), 1, now()),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(sale.lines.items().len(), 1);
        assert_eq!(sale.final_amount(), MONEY_MAX);

        let details = SaleDetails {
            tax_amount: dec!(1),
            ..SaleDetails::default()
        };
        assert!(sale.update_details(details, now()).is_err());
        assert_eq!(sale.lines.tax_amount(), Decimal::ZERO);
        assert_eq!(sale.lines.items().len(), 1);
    }

    #[test]
    fn test_payment_text_limits() {
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        sale.attach_payment(
            NewPayment {
                method: PaymentMethod::Cash,
                amount: dec!(5),
                payment_reference: None,
                notes: None,
            },
            now(),
        )
        .unwrap();

        let long_txn = "t".repeat(TRANSACTION_ID_MAX_CHARS + 1);
        assert!(matches!(
            sale.mark_payment_processed(Some(long_txn), now()),
            Err(DomainError::Validation(_))
        ));
        let long_reason = "r".repeat(NOTES_MAX_CHARS + 1);
        assert!(matches!(
            sale.mark_payment_failed(Some(long_reason), now()),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            sale.payment.as_ref().unwrap().status,
            PaymentStatus::Pending
        );

        sale.mark_payment_processed(Some("t".repeat(TRANSACTION_ID_MAX_CHARS)), now())
            .unwrap();
        assert_eq!(
            sale.payment.as_ref().unwrap().status,
            PaymentStatus::Completed
        );
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        let mut sale = pending(Decimal::ZERO, Decimal::ZERO);
        let result = sale.attach_payment(
            NewPayment {
                method: PaymentMethod::Cash,
                amount: Decimal::ZERO,
                payment_reference: None,
                notes: None,
            },
            now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_customer_email_validation() {
        let customer = Customer {
            email: Some("not-an-email".to_string()),
            ..Customer::default()
        };
        assert!(customer.validate().is_err());
        let customer = Customer {
            email: Some("ada@example.com".to_string()),
            ..Customer::default()
        };
        assert!(customer.validate().is_ok());
    }

    #[test]
    fn test_summary() {
        let mut a = pending(Decimal::ZERO, Decimal::ZERO);
        a.add_item(&product(1, dec!(10), 5), 1, now()).unwrap();
        let mut b = a.clone();
        b.cancel(now()).unwrap();
        let summary = SalesSummary::from_sales([&a, &a, &b]);
        assert_eq!(summary.total_sales, 3);
        assert_eq!(summary.total_revenue, dec!(30));
        assert_eq!(summary.by_status.len(), 2);
    }
}
