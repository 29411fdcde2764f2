//! Seed the database with demo data.
//!
//! Creates a few categories and products, activates the ones that pass
//! governance, and records one paid, completed sale per sellable product so
//! the trend report has something to show. Refuses to run against a catalog
//! that already has categories.

use emporium_catalog::{Catalog, CatalogConfig, NewSaleRequest};
use emporium_core::category::CategoryDetails;
use emporium_core::governance::Dimensions;
use emporium_core::product::{ProductDetails, ProductIdentifiers, ProductUpdate};
use emporium_core::sale::{Customer, NewPayment, SaleDetails};
use emporium_core::{CategoryId, PaymentMethod, PriceBounds, ProductId};
use rust_decimal::Decimal;
use rust_decimal::dec;

use super::{CommandError, catalog, connect};

struct DemoProduct {
    name: &'static str,
    sku: &'static str,
    price: Decimal,
    stock: i32,
    dimensions: Dimensions,
    hazmat: bool,
}

const DEMO_PRODUCTS: &[(&str, &[DemoProduct])] = &[
    (
        "Office",
        &[
            DemoProduct {
                name: "Height-adjustable standing desk with memory presets and cable tray",
                sku: "OFF-DESK-001",
                price: dec!(449.00),
                stock: 25,
                dimensions: Dimensions::new(62.0, 48.0, 30.0, 6.0),
                hazmat: false,
            },
            DemoProduct {
                name: "Ergonomic mesh office chair with adjustable lumbar support",
                sku: "OFF-CHAIR-001",
                price: dec!(289.99),
                stock: 40,
                dimensions: Dimensions::new(38.0, 28.0, 26.0, 14.0),
                hazmat: false,
            },
        ],
    ),
    (
        "Kitchen",
        &[
            DemoProduct {
                name: "Cast iron skillet",
                sku: "KIT-SKIL-010",
                price: dec!(34.50),
                stock: 8,
                dimensions: Dimensions::new(5.5, 18.0, 11.0, 2.5),
                hazmat: false,
            },
            DemoProduct {
                name: "Butane refill canister for culinary torches, four pack",
                sku: "KIT-BUTA-004",
                price: dec!(17.99),
                stock: 60,
                dimensions: Dimensions::new(2.0, 10.0, 6.0, 4.0),
                hazmat: true,
            },
        ],
    ),
];

/// Load demo data through the catalog services.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a service call fails.
pub async fn run(config: &CatalogConfig) -> Result<(), CommandError> {
    let catalog = catalog(config, connect(config).await?);

    if !catalog.categories.list().await?.is_empty() {
        return Err(CommandError::InvalidInput(
            "catalog already has categories; seed expects an empty database".to_string(),
        ));
    }

    let mut sellable = Vec::new();
    for (category_name, products) in DEMO_PRODUCTS {
        let category = catalog
            .categories
            .create(CategoryDetails::new(*category_name, None))
            .await?;
        tracing::info!(category = %category.name, "Created category");

        for demo in *products {
            if let Some(id) = seed_product(&catalog, category.id, demo).await? {
                sellable.push(id);
            }
        }
    }

    let mut sales = 0;
    for (i, id) in sellable.iter().enumerate() {
        let quantity = i32::try_from(i % 3 + 1).unwrap_or(1);
        seed_sale(&catalog, *id, quantity).await?;
        sales += 1;
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Categories: {}", DEMO_PRODUCTS.len());
    tracing::info!("  Sellable products: {}", sellable.len());
    tracing::info!("  Completed sales: {sales}");
    Ok(())
}

/// Create and try to activate one product. Returns its id when it ends up
/// active.
async fn seed_product(
    catalog: &Catalog,
    category_id: CategoryId,
    demo: &DemoProduct,
) -> Result<Option<ProductId>, CommandError> {
    let details = ProductDetails {
        name: demo.name.to_string(),
        description: Some(format!(
            "{}. Demo listing created by `emporium seed` for exercising the catalog, \
             governance and analytics features end to end.",
            demo.name
        )),
        price: demo.price,
        sku: demo.sku.to_string(),
        stock_quantity: demo.stock,
        image_url: Some(format!(
            "https://images.example.com/{}.jpg",
            demo.sku.to_lowercase()
        )),
        category_id,
        dimensions: demo.dimensions,
        is_hazmat: demo.hazmat,
        // The hazmat item has no data sheet and ends up blocked.
        safety_data_sheet_url: None,
        price_bounds: PriceBounds::new(Some(demo.price * dec!(0.8)), None),
        key_features: Some("Demo".to_string()),
        identifiers: ProductIdentifiers::default(),
        inventory_location: Some("A1".to_string()),
    };

    let created = catalog.products.create(details.clone()).await?;
    let saved = catalog
        .products
        .update(created.product.id(), ProductUpdate::new(details, true))
        .await?;

    tracing::info!(
        sku = demo.sku,
        status = %saved.product.status(),
        score = %saved.product.listing_quality_score(),
        "Seeded product"
    );
    if let Some(violation) = saved.violation {
        tracing::warn!(sku = demo.sku, %violation, "Product blocked by compliance");
        return Ok(None);
    }
    Ok(saved.product.is_active().then(|| saved.product.id()))
}

async fn seed_sale(catalog: &Catalog, product: ProductId, quantity: i32) -> Result<(), CommandError> {
    let sale = catalog
        .sales
        .create(NewSaleRequest {
            details: SaleDetails {
                customer: Customer {
                    name: Some("Demo Customer".to_string()),
                    email: Some("demo@example.com".to_string()),
                    city: Some("Portland".to_string()),
                    state: Some("OR".to_string()),
                    country: Some("US".to_string()),
                },
                tax_amount: Decimal::ZERO,
                ..SaleDetails::default()
            },
            items: vec![(product, quantity)],
        })
        .await?;

    catalog
        .sales
        .add_payment(
            sale.id,
            NewPayment {
                method: PaymentMethod::CreditCard,
                amount: sale.final_amount(),
                payment_reference: Some(sale.sale_number.clone()),
                notes: None,
            },
        )
        .await?;
    catalog
        .sales
        .mark_payment_processed(sale.id, Some(format!("demo_{}", sale.id)))
        .await?;
    catalog.sales.complete(sale.id).await?;
    Ok(())
}
