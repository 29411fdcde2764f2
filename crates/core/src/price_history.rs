//! Append-only record of product price changes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{PriceHistoryId, ProductId};

/// A price change waiting to be persisted alongside its product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPriceHistory {
    pub product_id: ProductId,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub changed_at: DateTime<Utc>,
}

impl NewPriceHistory {
    #[must_use]
    pub const fn new(
        product_id: ProductId,
        old_price: Decimal,
        new_price: Decimal,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            old_price,
            new_price,
            changed_at,
        }
    }

    #[must_use]
    pub const fn with_id(self, id: PriceHistoryId) -> PriceHistory {
        PriceHistory {
            id,
            product_id: self.product_id,
            old_price: self.old_price,
            new_price: self.new_price,
            changed_at: self.changed_at,
        }
    }
}

/// A recorded price change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub id: PriceHistoryId,
    pub product_id: ProductId,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub changed_at: DateTime<Utc>,
}

impl PriceHistory {
    /// Change relative to the old price, in percent. Zero when the old price
    /// was zero.
    #[must_use]
    pub fn percentage_change(&self) -> Decimal {
        if self.old_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.new_price - self.old_price) / self.old_price * Decimal::ONE_HUNDRED
    }

    #[must_use]
    pub fn is_increase(&self) -> bool {
        self.new_price > self.old_price
    }

    #[must_use]
    pub fn is_decrease(&self) -> bool {
        self.new_price < self.old_price
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::dec;

    use super::*;

    fn entry(old: Decimal, new: Decimal) -> PriceHistory {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        NewPriceHistory::new(ProductId::new(1), old, new, at).with_id(PriceHistoryId::new(9))
    }

    #[test]
    fn test_percentage_change() {
        let up = entry(dec!(20), dec!(25));
        assert_eq!(up.percentage_change(), dec!(25));
        assert!(up.is_increase());
        assert!(!up.is_decrease());

        let down = entry(dec!(50), dec!(40));
        assert_eq!(down.percentage_change(), dec!(-20));
        assert!(down.is_decrease());
    }

    #[test]
    fn test_zero_old_price() {
        assert_eq!(entry(Decimal::ZERO, dec!(5)).percentage_change(), Decimal::ZERO);
    }
}
