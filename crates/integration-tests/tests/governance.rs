//! Governance pipeline through the product service.

#![allow(clippy::unwrap_used)]

use emporium_catalog::CatalogConfig;
use emporium_core::governance::ComplianceViolation;
use emporium_core::product::{ProductIdentifiers, ProductUpdate};
use emporium_core::{BoundsCheck, MONEY_MAX, PriceBounds, ProductStatus};
use emporium_integration_tests::{TestContext, listing};
use rust_decimal::dec;

#[tokio::test]
async fn hazmat_listing_is_blocked_until_it_links_a_data_sheet() {
    let ctx = TestContext::new();
    let tools = ctx.category("Tools").await;

    let mut details = listing(
        "Cordless drill lithium-ion battery pack, 20V, 4.0Ah with fuel gauge",
        "BATT-20V",
        dec!(89.00),
        tools,
    );
    details.description = Some("d".repeat(120));
    details.key_features = Some("Fuel gauge".to_string());
    details.image_url = Some("https://img.example.com/batt.jpg".to_string());
    details.is_hazmat = true;

    let saved = ctx.catalog.products.create(details.clone()).await.unwrap();
    assert_eq!(saved.product.status(), ProductStatus::Blocked);
    assert_eq!(saved.violation, Some(ComplianceViolation::MissingSafetyDataSheet));
    assert_eq!(saved.product.listing_quality_score().value(), 80);

    let id = saved.product.id();
    let attempt = ctx
        .catalog
        .products
        .update(id, ProductUpdate::new(details.clone(), true))
        .await
        .unwrap();
    assert_eq!(attempt.product.status(), ProductStatus::Blocked);

    details.safety_data_sheet_url = Some("https://img.example.com/batt-sds.pdf".to_string());
    let fixed = ctx
        .catalog
        .products
        .update(id, ProductUpdate::new(details.clone(), true))
        .await
        .unwrap();
    assert_eq!(fixed.product.status(), ProductStatus::PendingReview);
    assert!(fixed.violation.is_none());

    let active = ctx
        .catalog
        .products
        .update(id, ProductUpdate::new(details, true))
        .await
        .unwrap();
    assert_eq!(active.product.status(), ProductStatus::Active);
    assert!(active.product.is_active());
}

#[tokio::test]
async fn restricted_phrase_blocks_an_active_listing() {
    let ctx = TestContext::new();
    let health = ctx.category("Health").await;

    let details = listing("Herbal tea", "TEA-001", dec!(9.50), health);
    let id = ctx
        .catalog
        .products
        .create(details.clone())
        .await
        .unwrap()
        .product
        .id();
    let active = ctx
        .catalog
        .products
        .update(id, ProductUpdate::new(details.clone(), true))
        .await
        .unwrap();
    assert_eq!(active.product.status(), ProductStatus::Active);

    let mut edited = details;
    edited.description = Some("A Miracle Cure for everything".to_string());
    let blocked = ctx
        .catalog
        .products
        .update(id, ProductUpdate::new(edited, true))
        .await
        .unwrap();
    assert_eq!(blocked.product.status(), ProductStatus::Blocked);
    assert!(matches!(
        blocked.violation,
        Some(ComplianceViolation::RestrictedPhrase { phrase: "miracle cure" })
    ));
}

#[tokio::test]
async fn score_is_recomputed_on_every_save() {
    let ctx = TestContext::new();
    let books = ctx.category("Books").await;

    let mut details = listing("Field guide", "BOOK-001", dec!(24.00), books);
    let saved = ctx.catalog.products.create(details.clone()).await.unwrap();
    assert_eq!(saved.product.listing_quality_score().value(), 0);

    details.identifiers = ProductIdentifiers {
        isbn: Some("9780000000001".to_string()),
        ..ProductIdentifiers::default()
    };
    details.image_url = Some("https://img.example.com/guide.jpg".to_string());
    let updated = ctx
        .catalog
        .products
        .update(saved.product.id(), ProductUpdate::new(details, false))
        .await
        .unwrap();
    assert_eq!(updated.product.listing_quality_score().value(), 40);
    assert_eq!(updated.product.status(), ProductStatus::Draft);
}

#[tokio::test]
async fn price_bounds_are_advisory_unless_enforced() {
    let mut details_bounds = PriceBounds::new(None, Some(dec!(50)));

    let ctx = TestContext::new();
    let toys = ctx.category("Toys").await;
    let mut details = listing("Kite", "KITE-01", dec!(75), toys);
    details.price_bounds = details_bounds;
    let saved = ctx.catalog.products.create(details.clone()).await.unwrap();
    assert_eq!(
        saved.price_bounds,
        BoundsCheck::AboveCeiling { ceiling: dec!(50) }
    );

    let strict = TestContext::with_config(&CatalogConfig {
        enforce_price_bounds: true,
        ..CatalogConfig::default()
    });
    let toys = strict.category("Toys").await;
    details.category_id = toys;
    let err = strict.catalog.products.create(details.clone()).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    details_bounds.ceiling = Some(dec!(80));
    details.price_bounds = details_bounds;
    let ok = strict.catalog.products.create(details).await.unwrap();
    assert!(ok.price_bounds.is_within());
}

#[tokio::test]
async fn fields_beyond_column_limits_are_rejected_before_storage() {
    let ctx = TestContext::new();
    let books = ctx.category("Books").await;
    let mut details = listing("Atlas", "BOOK-002", dec!(40), books);

    details.identifiers.upc = Some("0".repeat(21));
    let err = ctx.catalog.products.create(details.clone()).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    details.identifiers.upc = Some("0".repeat(20));
    details.inventory_location = Some("B".repeat(101));
    let err = ctx.catalog.products.create(details.clone()).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    details.inventory_location = Some("Shelf 3".to_string());
    details.price = MONEY_MAX + dec!(1);
    let err = ctx.catalog.products.create(details.clone()).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    details.price = dec!(40);
    let saved = ctx.catalog.products.create(details).await.unwrap();
    assert_eq!(saved.product.details().inventory_location.as_deref(), Some("Shelf 3"));
}
