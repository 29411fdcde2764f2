//! Price floor/ceiling bounds.
//!
//! Bounds are advisory data on a product. Checking them is cheap and pure;
//! whether a violation rejects a write is a service-level policy
//! (`EMPORIUM_ENFORCE_PRICE_BOUNDS`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest amount a money column (`NUMERIC(18, 2)`) can hold.
pub const MONEY_MAX: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 2);

/// Optional floor and ceiling for a product's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBounds {
    /// Lowest acceptable price, inclusive.
    pub floor: Option<Decimal>,
    /// Highest acceptable price, inclusive.
    pub ceiling: Option<Decimal>,
}

/// Outcome of checking a price against [`PriceBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsCheck {
    WithinBounds,
    BelowFloor { floor: Decimal },
    AboveCeiling { ceiling: Decimal },
}

impl BoundsCheck {
    #[must_use]
    pub const fn is_within(&self) -> bool {
        matches!(self, Self::WithinBounds)
    }
}

impl PriceBounds {
    /// Create bounds from optional floor and ceiling.
    #[must_use]
    pub const fn new(floor: Option<Decimal>, ceiling: Option<Decimal>) -> Self {
        Self { floor, ceiling }
    }

    /// Check `price` against the bounds. Absent bounds always pass.
    #[must_use]
    pub fn check(&self, price: Decimal) -> BoundsCheck {
        if let Some(floor) = self.floor
            && price < floor
        {
            return BoundsCheck::BelowFloor { floor };
        }
        if let Some(ceiling) = self.ceiling
            && price > ceiling
        {
            return BoundsCheck::AboveCeiling { ceiling };
        }
        BoundsCheck::WithinBounds
    }

    /// Returns `true` when floor and ceiling are in `0..=MONEY_MAX` and
    /// ordered.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let in_range = |v: Decimal| (Decimal::ZERO..=MONEY_MAX).contains(&v);
        let representable = self.floor.is_none_or(in_range) && self.ceiling.is_none_or(in_range);
        let ordered = match (self.floor, self.ceiling) {
            (Some(floor), Some(ceiling)) => floor <= ceiling,
            _ => true,
        };
        representable && ordered
    }
}
