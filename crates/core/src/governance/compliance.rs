//! Listing compliance screening.
//!
//! Rules run in a fixed order and stop at the first violation:
//!
//! 1. Name and description must not contain a restricted phrase
//!    (case-insensitive substring match).
//! 2. Hazmat listings must link a safety data sheet.
//!
//! A violation always yields [`ProductStatus::Blocked`]. A listing that was
//! blocked and now passes is moved to [`ProductStatus::PendingReview`] so a
//! human signs off before it can be activated again. Any other status is left
//! untouched.

use serde::Serialize;

use super::is_present;
use crate::product::ProductDetails;
use crate::types::ProductStatus;

/// Phrases that may not appear in a listing's name or description.
///
/// Stored lowercase; matching lowercases the listing text.
pub const RESTRICTED_PHRASES: &[&str] = &[
    "cures cancer",
    "cure for cancer",
    "miracle cure",
    "guaranteed weight loss",
    "lose weight fast",
    "fda approved",
    "prevents covid",
    "treats covid",
    "reverses aging",
    "100% effective",
    "clinically proven to cure",
    "no side effects",
];

/// The rule that blocked a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ComplianceViolation {
    /// Name or description contains a restricted phrase.
    RestrictedPhrase { phrase: &'static str },
    /// Hazmat listing without a safety data sheet.
    MissingSafetyDataSheet,
}

impl std::fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RestrictedPhrase { phrase } => write!(f, "restricted phrase \"{phrase}\""),
            Self::MissingSafetyDataSheet => f.write_str("hazmat listing without safety data sheet"),
        }
    }
}

/// Result of a compliance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceOutcome {
    /// Status after the check.
    pub status: ProductStatus,
    /// Rule that triggered a block, if any.
    pub violation: Option<ComplianceViolation>,
}

impl ComplianceOutcome {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.violation.is_none()
    }
}

/// Find the first rule the listing violates, if any.
#[must_use]
pub fn screen(details: &ProductDetails) -> Option<ComplianceViolation> {
    if let Some(phrase) = find_restricted_phrase(details) {
        return Some(ComplianceViolation::RestrictedPhrase { phrase });
    }
    if details.is_hazmat && !is_present(details.safety_data_sheet_url.as_deref()) {
        return Some(ComplianceViolation::MissingSafetyDataSheet);
    }
    None
}

/// Run compliance against a listing whose status is currently `current`.
#[must_use]
pub fn check(details: &ProductDetails, current: ProductStatus) -> ComplianceOutcome {
    let violation = screen(details);
    let status = match (violation, current) {
        (Some(_), _) => ProductStatus::Blocked,
        (None, ProductStatus::Blocked) => ProductStatus::PendingReview,
        (None, other) => other,
    };
    ComplianceOutcome { status, violation }
}

fn find_restricted_phrase(details: &ProductDetails) -> Option<&'static str> {
    let name = details.name.to_lowercase();
    let description = details
        .description
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();

    RESTRICTED_PHRASES
        .iter()
        .copied()
        .find(|phrase| name.contains(phrase) || description.contains(phrase))
}
