//! Product status transitions.
//!
//! ```text
//!   create ──► Draft ──activate──► Active ──deactivate──► Draft
//!                 │                   │
//!                 └─── violation ─────┴──► Blocked ──passes──► PendingReview
//! ```
//!
//! The operator's request is resolved first, then compliance has the final
//! word: a violation always blocks, and a blocked listing that passes only
//! gets as far as review.

use serde::{Deserialize, Serialize};

use super::compliance::{self, ComplianceViolation};
use super::quality::{self, ListingScore};
use crate::product::ProductDetails;
use crate::types::ProductStatus;

/// What the operator asked for on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIntent {
    /// Leave the status as it is.
    #[default]
    Keep,
    Activate,
    Deactivate,
}

impl From<bool> for StatusIntent {
    /// Map an `is_active` toggle.
    fn from(is_active: bool) -> Self {
        if is_active {
            Self::Activate
        } else {
            Self::Deactivate
        }
    }
}

/// Resolve an operator request without looking at the listing content.
///
/// Blocked listings cannot be activated or deactivated by hand.
#[must_use]
pub const fn requested_status(current: ProductStatus, intent: StatusIntent) -> ProductStatus {
    match (current, intent) {
        (ProductStatus::Blocked, _) | (_, StatusIntent::Keep) => current,
        (_, StatusIntent::Activate) => ProductStatus::Active,
        (ProductStatus::Active | ProductStatus::PendingReview, StatusIntent::Deactivate) => {
            ProductStatus::Draft
        }
        (ProductStatus::Draft, StatusIntent::Deactivate) => ProductStatus::Draft,
    }
}

/// Outcome of running a listing through the full pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub score: ListingScore,
    pub status: ProductStatus,
    pub violation: Option<ComplianceViolation>,
}

/// Evaluate a listing for a brand new product. The activation intent is
/// ignored: new products always start in draft.
#[must_use]
pub fn evaluate_new(details: &ProductDetails) -> Evaluation {
    evaluate(details, ProductStatus::Draft, StatusIntent::Keep)
}

/// Evaluate a listing on save.
#[must_use]
pub fn evaluate(
    details: &ProductDetails,
    current: ProductStatus,
    intent: StatusIntent,
) -> Evaluation {
    let tentative = requested_status(current, intent);
    let outcome = compliance::check(details, tentative);
    Evaluation {
        score: quality::score(details),
        status: outcome.status,
        violation: outcome.violation,
    }
}
