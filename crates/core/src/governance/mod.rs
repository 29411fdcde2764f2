//! Product governance pipeline.
//!
//! Every product save passes through the same steps: the requested status
//! change is resolved by [`workflow`], the listing is scored by [`quality`]
//! and screened by [`compliance`]. All of it is pure and infallible.
//! [`fulfillment`] estimates outbound fees from package dimensions.

pub mod compliance;
pub mod fulfillment;
pub mod quality;
pub mod workflow;

pub use compliance::{ComplianceOutcome, ComplianceViolation, RESTRICTED_PHRASES};
pub use fulfillment::{Dimensions, estimate_fee};
pub use quality::{ListingScore, QualityBreakdown};
pub use workflow::{Evaluation, StatusIntent};

/// A text field counts as present when it has something besides whitespace.
pub(crate) fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
