//! Sale lifecycle, stock and the trend report.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use emporium_catalog::{CatalogStore, NewSaleRequest, SaleListQuery};
use emporium_core::analytics::TrendDirection;
use emporium_core::product::{ProductDetails, ProductUpdate};
use emporium_core::sale::{Customer, NewPayment, NewSale, SaleDetails};
use emporium_core::{PageRequest, PaymentMethod, ProductId, SaleStatus};
use emporium_integration_tests::{TestContext, listing};
use rust_decimal::dec;

fn customer(name: &str, city: &str) -> SaleDetails {
    SaleDetails {
        customer: Customer {
            name: Some(name.to_string()),
            city: Some(city.to_string()),
            state: Some("TX".to_string()),
            ..Customer::default()
        },
        ..SaleDetails::default()
    }
}

/// Create a listing and activate it.
async fn on_sale(ctx: &TestContext, details: ProductDetails) -> ProductId {
    let id = ctx
        .catalog
        .products
        .create(details.clone())
        .await
        .unwrap()
        .product
        .id();
    ctx.catalog
        .products
        .update(id, ProductUpdate::new(details, true))
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn completing_a_sale_takes_stock_for_every_line_or_none() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let pen = on_sale(&ctx, listing("Gel pen", "PEN-01", dec!(2.50), office)).await;
    let pad = on_sale(&ctx, listing("Legal pad", "PAD-01", dec!(4.00), office)).await;
    let mut draft = listing("Binder clip", "CLIP-01", dec!(0.10), office);
    draft.stock_quantity = 1;
    ctx.catalog.products.create(draft).await.unwrap();

    let greedy = ctx
        .catalog
        .sales
        .create(NewSaleRequest {
            details: customer("Grace", "Austin"),
            items: vec![(pen, 5), (pad, 11)],
        })
        .await
        .unwrap();
    assert_eq!(
        ctx.catalog.sales.complete(greedy.id).await.unwrap_err().kind(),
        "conflict"
    );
    assert_eq!(ctx.catalog.products.get(pen).await.unwrap().stock_quantity(), 10);

    let fair = ctx
        .catalog
        .sales
        .create(NewSaleRequest {
            details: customer("Linus", "Dallas"),
            items: vec![(pen, 5), (pad, 10)],
        })
        .await
        .unwrap();
    ctx.catalog.sales.complete(fair.id).await.unwrap();
    assert_eq!(ctx.catalog.products.get(pen).await.unwrap().stock_quantity(), 5);
    assert_eq!(ctx.catalog.products.get(pad).await.unwrap().stock_quantity(), 0);

    // Sold products cannot be deleted.
    assert_eq!(
        ctx.catalog.products.delete(pad).await.unwrap_err().kind(),
        "conflict"
    );

    let low = ctx.catalog.products.low_stock(Some(5)).await.unwrap();
    let skus: Vec<&str> = low.iter().map(|p| p.sku()).collect();
    assert_eq!(skus, ["PAD-01", "PEN-01"]);
}

#[tokio::test]
async fn sale_lines_keep_the_price_at_time_of_sale() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let details = listing("Desk lamp", "LAMP-01", dec!(30), office);
    let lamp = ctx
        .catalog
        .products
        .create(details.clone())
        .await
        .unwrap()
        .product
        .id();

    let sale = ctx
        .catalog
        .sales
        .create(NewSaleRequest {
            details: customer("Grace", "Austin"),
            items: vec![(lamp, 2)],
        })
        .await
        .unwrap();

    let mut repriced = details;
    repriced.price = dec!(35);
    ctx.catalog
        .products
        .update(lamp, ProductUpdate::new(repriced, false))
        .await
        .unwrap();

    let completed = ctx.catalog.sales.complete(sale.id).await.unwrap();
    let line = completed.lines.items().first().unwrap();
    assert_eq!(line.unit_price, dec!(30));
    assert_eq!(completed.final_amount(), dec!(60));
}

#[tokio::test]
async fn sale_list_filters_by_status_and_customer() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let pen = ctx
        .catalog
        .products
        .create(listing("Gel pen", "PEN-01", dec!(2.50), office))
        .await
        .unwrap()
        .product
        .id();

    for name in ["Grace Hopper", "Ada Lovelace", "Grace Kelly"] {
        ctx.catalog
            .sales
            .create(NewSaleRequest {
                details: customer(name, "Austin"),
                items: vec![(pen, 1)],
            })
            .await
            .unwrap();
    }
    let first = ctx
        .catalog
        .sales
        .list(&SaleListQuery::default())
        .await
        .unwrap();
    assert_eq!(first.total_items, 3);
    ctx.catalog
        .sales
        .cancel(first.items.first().unwrap().id)
        .await
        .unwrap();

    let graces = SaleListQuery {
        page: PageRequest::new(1, 10),
        customer: Some("grace".to_string()),
        ..SaleListQuery::default()
    };
    assert_eq!(ctx.catalog.sales.list(&graces).await.unwrap().total_items, 2);

    let pending = SaleListQuery {
        status: Some(SaleStatus::Pending),
        ..SaleListQuery::default()
    };
    assert_eq!(ctx.catalog.sales.list(&pending).await.unwrap().total_items, 2);

    let summary = ctx.catalog.sales.summary().await.unwrap();
    assert_eq!(summary.total_sales, 3);
    assert_eq!(summary.total_revenue, dec!(7.50));
}

#[tokio::test]
async fn oversized_lines_and_payment_text_are_validation_errors() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let pen = on_sale(&ctx, listing("Gel pen", "PEN-01", dec!(0.01), office)).await;

    let err = ctx
        .catalog
        .sales
        .create(NewSaleRequest {
            details: customer("Grace", "Austin"),
            items: vec![(pen, i32::MAX), (pen, 1)],
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let sale = ctx
        .catalog
        .sales
        .create(NewSaleRequest {
            details: customer("Grace", "Austin"),
            items: vec![(pen, i32::MAX)],
        })
        .await
        .unwrap();
    let err = ctx.catalog.sales.add_item(sale.id, pen, 1).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
    let stored = ctx.catalog.sales.get(sale.id).await.unwrap();
    assert_eq!(stored.lines.items().first().unwrap().quantity, i32::MAX);

    ctx.catalog
        .sales
        .add_payment(
            sale.id,
            NewPayment {
                method: PaymentMethod::BankTransfer,
                amount: stored.final_amount(),
                payment_reference: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    let err = ctx
        .catalog
        .sales
        .mark_payment_processed(sale.id, Some("x".repeat(101)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    let err = ctx
        .catalog
        .sales
        .mark_payment_failed(sale.id, Some("x".repeat(501)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

/// Store a completed sale dated `days_ago`.
async fn backdated_sale(ctx: &TestContext, product: ProductId, quantity: i32, days_ago: i64) {
    let when = Utc::now() - Duration::days(days_ago);
    let stored = ctx.catalog.products.get(product).await.unwrap();
    let mut sale = NewSale::new(
        format!("SALE-TEST-{days_ago:04}-{quantity}"),
        customer("Grace", "Austin"),
        when,
    )
    .unwrap();
    sale.add_item(&stored, quantity).unwrap();
    let sale = ctx.store.insert_sale(sale).await.unwrap();
    ctx.catalog.sales.complete(sale.id).await.unwrap();
}

#[tokio::test]
async fn trend_report_reflects_the_last_thirty_days() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let mut chair = listing("Task chair", "CHAIR-01", dec!(100), office);
    chair.stock_quantity = 100;
    let chair = ctx
        .catalog
        .products
        .create(chair)
        .await
        .unwrap()
        .product
        .id();

    backdated_sale(&ctx, chair, 1, 45).await;
    backdated_sale(&ctx, chair, 1, 20).await;
    backdated_sale(&ctx, chair, 2, 10).await;
    backdated_sale(&ctx, chair, 3, 2).await;

    let report = ctx.catalog.analytics.trend_report().await.unwrap();
    assert_eq!(report.revenue_last_30_days, dec!(600));
    assert_eq!(report.revenue_last_7_days, dec!(300));
    assert_eq!(report.forecast.predicted_revenue, dec!(140));
    assert_eq!(report.forecast.trend, TrendDirection::Uptrend);

    let top = report.top_products.first().unwrap();
    assert_eq!(top.quantity_sold, 6);
    assert_eq!(top.revenue, dec!(600));
    assert_eq!(report.locations.first().unwrap().sale_count, 3);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["forecast"]["trend"], "uptrend");
}
