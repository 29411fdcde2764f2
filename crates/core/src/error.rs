//! Domain rule violations.

use thiserror::Error;

use crate::types::{ProductId, SaleStatus};

/// Errors raised when a domain operation would break an invariant.
///
/// These never carry I/O failures; persistence errors live in the catalog
/// crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Input failed field-level validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Quantities must be strictly positive.
    #[error("quantity must be positive (got {0})")]
    NonPositiveQuantity(i32),

    /// Stock cannot go negative.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// The sale is not in a state that allows the requested action.
    #[error("cannot {action} a {status} sale")]
    InvalidSaleTransition {
        status: SaleStatus,
        action: &'static str,
    },

    /// A sale carries at most one payment record.
    #[error("sale already has payment information")]
    PaymentAlreadyRecorded,

    /// The sale has no payment record to update.
    #[error("sale has no payment information")]
    PaymentMissing,

    /// A sale line refers to a product that could not be loaded.
    #[error("product {0} not found")]
    ProductMissing(ProductId),
}

impl DomainError {
    /// Whether the error is a state conflict (as opposed to bad input).
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::InsufficientStock { .. }
                | Self::InvalidSaleTransition { .. }
                | Self::PaymentAlreadyRecorded
                | Self::PaymentMissing
        )
    }

    /// Whether the error refers to a record that does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ProductMissing(_))
    }
}

/// Reject an optional text field longer than `max` characters.
pub(crate) fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), DomainError> {
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(DomainError::Validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = DomainError::InvalidSaleTransition {
            status: SaleStatus::Completed,
            action: "cancel",
        };
        assert_eq!(err.to_string(), "cannot cancel a completed sale");
        assert!(err.is_conflict());
        assert!(!DomainError::NonPositiveQuantity(0).is_conflict());
        assert!(DomainError::ProductMissing(ProductId::new(4)).is_not_found());
    }
}
