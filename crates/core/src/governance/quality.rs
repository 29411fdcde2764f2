//! Listing quality score.
//!
//! Five independent criteria, 20 points each, no partial credit. The score
//! is a pure function of the current listing fields and is recomputed on
//! every save.

use serde::{Deserialize, Serialize};

use super::is_present;
use crate::product::ProductDetails;

/// Points awarded for each satisfied criterion.
pub const POINTS_PER_CRITERION: u8 = 20;
/// A name of at least this many characters counts as descriptive.
pub const MIN_NAME_CHARS: usize = 50;
/// A description must be strictly longer than this many characters.
pub const MIN_DESCRIPTION_CHARS: usize = 100;

/// A listing completeness score in `0..=100`, always a multiple of 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingScore(u8);

impl ListingScore {
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for ListingScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ListingScore> for i32 {
    fn from(score: ListingScore) -> Self {
        Self::from(score.0)
    }
}

/// Which quality criteria a listing meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub descriptive_name: bool,
    pub rich_description: bool,
    pub key_features: bool,
    pub image: bool,
    pub product_identifier: bool,
}

impl QualityBreakdown {
    /// Evaluate every criterion against the listing.
    #[must_use]
    pub fn evaluate(details: &ProductDetails) -> Self {
        let ids = &details.identifiers;
        Self {
            descriptive_name: details.name.chars().count() >= MIN_NAME_CHARS,
            rich_description: details
                .description
                .as_deref()
                .is_some_and(|d| d.chars().count() > MIN_DESCRIPTION_CHARS),
            key_features: is_present(details.key_features.as_deref()),
            image: is_present(details.image_url.as_deref()),
            product_identifier: is_present(ids.upc.as_deref())
                || is_present(ids.gtin.as_deref())
                || is_present(ids.isbn.as_deref()),
        }
    }

    /// Number of satisfied criteria.
    #[must_use]
    pub fn met(&self) -> u8 {
        [
            self.descriptive_name,
            self.rich_description,
            self.key_features,
            self.image,
            self.product_identifier,
        ]
        .into_iter()
        .map(u8::from)
        .sum()
    }

    #[must_use]
    pub fn score(&self) -> ListingScore {
        ListingScore(self.met() * POINTS_PER_CRITERION)
    }
}

/// Score a listing.
#[must_use]
pub fn score(details: &ProductDetails) -> ListingScore {
    QualityBreakdown::evaluate(details).score()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::test_support::details;
    use proptest::prelude::*;

    #[test]
    fn test_empty_listing_scores_zero() {
        let mut d = details("ab");
        d.description = None;
        assert_eq!(score(&d).value(), 0);
    }

    #[test]
    fn test_eighty_without_identifiers() {
        let mut d = details(&"n".repeat(60));
        d.description = Some("d".repeat(150));
        d.key_features = Some("x".to_string());
        d.image_url = Some("y".to_string());
        assert_eq!(score(&d).value(), 80);

        let breakdown = QualityBreakdown::evaluate(&d);
        assert!(!breakdown.product_identifier);
        assert_eq!(breakdown.met(), 4);
    }

    #[test]
    fn test_thresholds_are_exact() {
        let mut d = details(&"n".repeat(49));
        d.description = Some("d".repeat(100));
        let b = QualityBreakdown::evaluate(&d);
        assert!(!b.descriptive_name);
        assert!(!b.rich_description);

        d.name = "n".repeat(50);
        d.description = Some("d".repeat(101));
        let b = QualityBreakdown::evaluate(&d);
        assert!(b.descriptive_name);
        assert!(b.rich_description);
    }

    #[test]
    fn test_whitespace_fields_are_absent() {
        let mut d = details("plain");
        d.key_features = Some("   ".to_string());
        d.identifiers.isbn = Some(String::new());
        assert_eq!(score(&d).value(), 0);

        d.identifiers.gtin = Some("00012345600012".to_string());
        assert_eq!(score(&d).value(), 20);
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded_multiple_of_twenty(
            name in ".{0,80}",
            description in proptest::option::of(".{0,200}"),
            key_features in proptest::option::of(".{0,5}"),
            image in proptest::option::of(".{0,5}"),
            upc in proptest::option::of(".{0,5}"),
        ) {
            let mut d = details(&name);
            d.description = description;
            d.key_features = key_features;
            d.image_url = image;
            d.identifiers.upc = upc;
            let s = score(&d).value();
            prop_assert!(s <= 100);
            prop_assert_eq!(s % 20, 0);
        }
    }
}
