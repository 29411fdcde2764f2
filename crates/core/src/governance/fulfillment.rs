//! Fulfillment fee estimate from package weight and dimensions.
//!
//! Carriers bill the greater of actual and dimensional weight, where
//! dimensional weight is the package volume in cubic inches divided by 139.
//! The first pound is covered by the base fee; every further pound (fractions
//! included) costs 0.50.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Cubic inches per billable pound.
pub const DIMENSIONAL_DIVISOR: f64 = 139.0;
/// Flat fee covering the first pound.
pub const BASE_FEE: f64 = 5.0;
/// Fee per pound above the first.
pub const PER_POUND_FEE: f64 = 0.5;

/// Package weight (pounds) and dimensions (inches).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[must_use]
    pub const fn new(weight: f64, length: f64, width: f64, height: f64) -> Self {
        Self {
            weight,
            length,
            width,
            height,
        }
    }

    #[must_use]
    pub fn dimensional_weight(&self) -> f64 {
        self.length * self.width * self.height / DIMENSIONAL_DIVISOR
    }

    /// Greater of actual and dimensional weight.
    #[must_use]
    pub fn billable_weight(&self) -> f64 {
        self.weight.max(self.dimensional_weight())
    }

    /// All measurements are finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.weight, self.length, self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Estimate the fulfillment fee, rounded to cents.
///
/// Inputs are not validated; callers reject bad dimensions before saving.
/// A fee beyond what a `Decimal` can hold saturates at [`Decimal::MAX`].
#[must_use]
pub fn estimate_fee(dimensions: &Dimensions) -> Decimal {
    let extra = (dimensions.billable_weight() - 1.0).max(0.0);
    let fee = extra.mul_add(PER_POUND_FEE, BASE_FEE);
    Decimal::from_f64(fee).unwrap_or(Decimal::MAX).round_dp(2)
}
