//! Categories, soft deletes and the product list cache.

#![allow(clippy::unwrap_used)]

use emporium_catalog::{CacheProvider, ProductListQuery};
use emporium_core::category::CategoryDetails;
use emporium_core::product::ProductUpdate;
use emporium_core::{PageRequest, SortDirection};
use emporium_integration_tests::{TestContext, listing};
use rust_decimal::dec;

async fn warm(ctx: &TestContext, queries: &[&ProductListQuery]) {
    for query in queries {
        ctx.catalog.products.list(query).await.unwrap();
    }
}

#[tokio::test]
async fn category_delete_waits_for_its_products() {
    let ctx = TestContext::new();
    let garden = ctx.category("Garden").await;
    let hose = ctx
        .catalog
        .products
        .create(listing("Garden hose", "HOSE-50", dec!(29.99), garden))
        .await
        .unwrap();

    let err = ctx.catalog.categories.delete(garden).await.unwrap_err();
    assert_eq!(err.kind(), "conflict");

    ctx.catalog.products.delete(hose.product.id()).await.unwrap();
    ctx.catalog.categories.delete(garden).await.unwrap();
    assert!(ctx.catalog.categories.list().await.unwrap().is_empty());

    // A deleted product still owns its SKU.
    let err = ctx
        .catalog
        .products
        .create(listing("Hose", "hose-50", dec!(9.99), ctx.category("Outdoor").await))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "conflict");

    let restored = ctx.catalog.categories.restore(garden).await.unwrap();
    assert_eq!(restored.name, "Garden");
}

#[tokio::test]
async fn product_list_cache_is_dropped_on_every_mutation() {
    let ctx = TestContext::new();
    let kitchen = ctx.category("Kitchen").await;
    let pan = ctx
        .catalog
        .products
        .create(listing("Frying pan", "PAN-28", dec!(39.00), kitchen))
        .await
        .unwrap()
        .product
        .id();

    let by_price = ProductListQuery::new(
        PageRequest::new(1, 20).sorted_by("price", SortDirection::Desc),
    );
    let everything = ProductListQuery::new(PageRequest::new(1, 20));

    let queries = [&by_price, &everything];

    warm(&ctx, &queries).await;
    assert!(ctx.cache.get(&by_price.cache_key()).await.is_some());
    assert!(ctx.cache.get(&everything.cache_key()).await.is_some());

    ctx.catalog.products.update_stock(pan, 2).await.unwrap();
    assert!(ctx.cache.get(&by_price.cache_key()).await.is_none());
    assert!(ctx.cache.get(&everything.cache_key()).await.is_none());

    warm(&ctx, &queries).await;
    ctx.catalog.products.delete(pan).await.unwrap();
    assert!(ctx.cache.get(&everything.cache_key()).await.is_none());
    assert_eq!(
        ctx.catalog.products.list(&everything).await.unwrap().total_items,
        0
    );

    warm(&ctx, &queries).await;
    ctx.catalog.products.restore(pan).await.unwrap();
    assert_eq!(
        ctx.catalog.products.list(&everything).await.unwrap().total_items,
        1
    );
}

#[tokio::test]
async fn product_list_filters_and_pages() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let kitchen = ctx.category("Kitchen").await;

    for (i, price) in [dec!(5), dec!(15), dec!(25)].into_iter().enumerate() {
        ctx.catalog
            .products
            .create(listing(&format!("Notebook {i}"), &format!("NOTE-{i}"), price, office))
            .await
            .unwrap();
    }
    let kettle = listing("Kettle", "KETTLE-1", dec!(45), kitchen);
    let kettle_id = ctx
        .catalog
        .products
        .create(kettle.clone())
        .await
        .unwrap()
        .product
        .id();
    ctx.catalog
        .products
        .update(kettle_id, ProductUpdate::new(kettle, true))
        .await
        .unwrap();

    let mut query = ProductListQuery::new(
        PageRequest::new(1, 2).sorted_by("price", SortDirection::Desc),
    );
    query.category_id = Some(office);
    let page = ctx.catalog.products.list(&query).await.unwrap();
    assert_eq!(page.total_items, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items.first().unwrap().price(), dec!(25));

    let mut search = ProductListQuery::new(PageRequest::new(1, 10));
    search.search = Some("  note ".to_string());
    assert_eq!(ctx.catalog.products.list(&search).await.unwrap().total_items, 3);

    let mut active = ProductListQuery::new(PageRequest::new(1, 10));
    active.is_active = Some(true);
    let page = ctx.catalog.products.list(&active).await.unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items.first().unwrap().sku(), "KETTLE-1");

    let summaries = ctx.catalog.categories.list().await.unwrap();
    let names: Vec<&str> = summaries.iter().map(|s| s.category.name.as_str()).collect();
    assert_eq!(names, ["Kitchen", "Office"]);
}

#[tokio::test]
async fn price_history_is_kept_newest_first() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let details = listing("Stapler", "STAPLE-1", dec!(10), office);
    let id = ctx
        .catalog
        .products
        .create(details.clone())
        .await
        .unwrap()
        .product
        .id();

    for price in [dec!(12), dec!(9)] {
        let mut d = details.clone();
        d.price = price;
        ctx.catalog
            .products
            .update(id, ProductUpdate::new(d, false))
            .await
            .unwrap();
    }
    let mut unchanged = details;
    unchanged.price = dec!(9);
    unchanged.name = "Heavy stapler".to_string();
    ctx.catalog
        .products
        .update(id, ProductUpdate::new(unchanged, false))
        .await
        .unwrap();

    let history = ctx.catalog.products.price_history(id).await.unwrap();
    assert_eq!(history.len(), 2);
    let newest = history.first().unwrap();
    assert_eq!((newest.old_price, newest.new_price), (dec!(12), dec!(9)));
    assert!(newest.is_decrease());
}

#[tokio::test]
async fn category_rename_conflicts_with_live_names_only() {
    let ctx = TestContext::new();
    let office = ctx.category("Office").await;
    let den = ctx.category("Den").await;

    let err = ctx
        .catalog
        .categories
        .update(den, CategoryDetails::new("OFFICE", None))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "conflict");

    ctx.catalog.categories.delete(office).await.unwrap();
    let renamed = ctx
        .catalog
        .categories
        .update(den, CategoryDetails::new("Office", None))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Office");
}
