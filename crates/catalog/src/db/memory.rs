//! In-memory [`CatalogStore`] for tests and demos.
//!
//! Enforces the same uniqueness rules as the `PostgreSQL` schema. A single
//! lock guards all tables, so every operation is atomic.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emporium_core::analytics::{SaleRecord, SoldLine};
use emporium_core::category::{Category, CategorySummary, NewCategory};
use emporium_core::price_history::{NewPriceHistory, PriceHistory};
use emporium_core::product::{NewProduct, Product, ProductChange};
use emporium_core::sale::{NewSale, Sale, SalesSummary};
use emporium_core::{
    CategoryId, Page, PriceHistoryId, ProductId, SaleId, SaleStatus, SortDirection,
};
use tokio::sync::Mutex;

use super::{CatalogStore, RepositoryError};
use crate::query::{ProductListQuery, ProductSort, SaleListQuery, SaleSort};

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<i32, Category>,
    products: BTreeMap<i32, Product>,
    price_history: Vec<PriceHistory>,
    sales: BTreeMap<i32, Sale>,
    last_category_id: i32,
    last_product_id: i32,
    last_price_history_id: i32,
    last_sale_id: i32,
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

impl Tables {
    fn category_name_taken(&self, name: &str, except: Option<CategoryId>) -> bool {
        self.categories.values().any(|c| {
            !c.lifecycle.is_deleted() && Some(c.id) != except && c.has_name(name)
        })
    }

    fn sku_taken(&self, sku: &str, except: Option<ProductId>) -> bool {
        let sku = sku.trim().to_lowercase();
        self.products
            .values()
            .any(|p| Some(p.id()) != except && p.sku().trim().to_lowercase() == sku)
    }

    fn live_products_in(&self, id: CategoryId) -> u64 {
        self.products
            .values()
            .filter(|p| !p.is_deleted() && p.category_id() == id)
            .count() as u64
    }

    fn append_price_change(&mut self, change: &NewPriceHistory) {
        let id = PriceHistoryId::new(next_id(&mut self.last_price_history_id));
        self.price_history.push(change.with_id(id));
    }

    fn category_name_for(&self, product_id: ProductId) -> String {
        self.products
            .get(&product_id.as_i32())
            .and_then(|p| self.categories.get(&p.category_id().as_i32()))
            .map_or_else(|| UNCATEGORIZED.to_string(), |c| c.name.clone())
    }
}

fn paginate<T: Clone>(items: &[T], page: &emporium_core::PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    items
        .iter()
        .skip(offset)
        .take(page.page_size as usize)
        .cloned()
        .collect()
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn compare_products(sort: ProductSort, a: &Product, b: &Product) -> Ordering {
    let primary = match sort {
        ProductSort::Id => Ordering::Equal,
        ProductSort::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        ProductSort::Price => a.price().cmp(&b.price()),
        ProductSort::Sku => a.sku().to_lowercase().cmp(&b.sku().to_lowercase()),
        ProductSort::StockQuantity => a.stock_quantity().cmp(&b.stock_quantity()),
        ProductSort::ListingQualityScore => {
            a.listing_quality_score().cmp(&b.listing_quality_score())
        }
        ProductSort::CreatedAt => a.lifecycle().created_at.cmp(&b.lifecycle().created_at),
    };
    primary.then_with(|| a.id().as_i32().cmp(&b.id().as_i32()))
}

fn compare_sales(sort: SaleSort, a: &Sale, b: &Sale) -> Ordering {
    let primary = match sort {
        SaleSort::SaleDate => a.sale_date.cmp(&b.sale_date),
        SaleSort::SaleNumber => a.sale_number.cmp(&b.sale_number),
        SaleSort::FinalAmount => a.final_amount().cmp(&b.final_amount()),
    };
    primary.then_with(|| a.id.as_i32().cmp(&b.id.as_i32()))
}

/// Catalog store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    tables: Mutex<Tables>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.category_name_taken(&category.details.name, None) {
            return Err(RepositoryError::Conflict(
                "category name already exists".to_owned(),
            ));
        }
        let id = CategoryId::new(next_id(&mut tables.last_category_id));
        let category = category.with_id(id);
        tables.categories.insert(id.as_i32(), category.clone());
        Ok(category)
    }

    async fn get_category(
        &self,
        id: CategoryId,
        include_deleted: bool,
    ) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .categories
            .get(&id.as_i32())
            .filter(|c| include_deleted || !c.lifecycle.is_deleted())
            .cloned())
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .categories
            .values()
            .find(|c| !c.lifecycle.is_deleted() && c.has_name(name))
            .cloned())
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.categories.contains_key(&category.id.as_i32()) {
            return Err(RepositoryError::NotFound);
        }
        if !category.lifecycle.is_deleted()
            && tables.category_name_taken(&category.name, Some(category.id))
        {
            return Err(RepositoryError::Conflict(
                "category name already exists".to_owned(),
            ));
        }
        tables
            .categories
            .insert(category.id.as_i32(), category.clone());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut summaries: Vec<CategorySummary> = tables
            .categories
            .values()
            .filter(|c| !c.lifecycle.is_deleted())
            .map(|c| CategorySummary {
                category: c.clone(),
                product_count: tables.live_products_in(c.id),
            })
            .collect();
        summaries.sort_by_key(|s| s.category.name.to_lowercase());
        Ok(summaries)
    }

    async fn count_products_in_category(&self, id: CategoryId) -> Result<u64, RepositoryError> {
        Ok(self.tables.lock().await.live_products_in(id))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.sku_taken(&product.details.sku, None) {
            return Err(RepositoryError::Conflict("sku already exists".to_owned()));
        }
        let id = ProductId::new(next_id(&mut tables.last_product_id));
        let product = product.with_id(id);
        tables.products.insert(id.as_i32(), product.clone());
        Ok(product)
    }

    async fn get_product(
        &self,
        id: ProductId,
        include_deleted: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .get(&id.as_i32())
            .filter(|p| include_deleted || !p.is_deleted())
            .cloned())
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError> {
        let sku = sku.trim().to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .values()
            .find(|p| p.sku().trim().to_lowercase() == sku)
            .cloned())
    }

    async fn update_product(
        &self,
        product: &Product,
        price_change: Option<&NewPriceHistory>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&product.id().as_i32()) {
            return Err(RepositoryError::NotFound);
        }
        if tables.sku_taken(product.sku(), Some(product.id())) {
            return Err(RepositoryError::Conflict("sku already exists".to_owned()));
        }
        tables
            .products
            .insert(product.id().as_i32(), product.clone());
        if let Some(change) = price_change {
            tables.append_price_change(change);
        }
        Ok(())
    }

    async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> Result<Page<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        let sort = query.sort();
        let mut matching: Vec<&Product> = tables
            .products
            .values()
            .filter(|p| query.matches(p))
            .collect();
        matching.sort_by(|a, b| directed(compare_products(sort, a, b), query.page.sort_direction));
        let matching: Vec<Product> = matching.into_iter().cloned().collect();
        Ok(Page::new(
            paginate(&matching, &query.page),
            &query.page,
            matching.len() as u64,
        ))
    }

    async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut low: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.is_active() && p.stock_quantity() <= threshold)
            .cloned()
            .collect();
        low.sort_by(|a, b| {
            a.stock_quantity()
                .cmp(&b.stock_quantity())
                .then_with(|| a.id().as_i32().cmp(&b.id().as_i32()))
        });
        Ok(low)
    }

    async fn product_has_sales(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sales
            .values()
            .any(|s| s.lines.items().iter().any(|item| item.product_id == id)))
    }

    async fn price_history(&self, id: ProductId) -> Result<Vec<PriceHistory>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut history: Vec<PriceHistory> = tables
            .price_history
            .iter()
            .filter(|h| h.product_id == id)
            .copied()
            .collect();
        history.sort_by(|a, b| {
            b.changed_at
                .cmp(&a.changed_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(history)
    }

    async fn insert_sale(&self, sale: NewSale) -> Result<Sale, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables
            .sales
            .values()
            .any(|s| s.sale_number == sale.sale_number)
        {
            return Err(RepositoryError::Conflict(
                "sale number already exists".to_owned(),
            ));
        }
        let id = SaleId::new(next_id(&mut tables.last_sale_id));
        let sale = sale.with_id(id);
        tables.sales.insert(id.as_i32(), sale.clone());
        Ok(sale)
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sales
            .get(&id.as_i32())
            .filter(|s| !s.lifecycle.is_deleted())
            .cloned())
    }

    async fn update_sale(&self, sale: &Sale) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.sales.get_mut(&sale.id.as_i32()) {
            Some(stored) => {
                *stored = sale.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn complete_sale(
        &self,
        sale: &Sale,
        changes: &[ProductChange],
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.sales.contains_key(&sale.id.as_i32()) {
            return Err(RepositoryError::NotFound);
        }
        let now = sale.lifecycle.updated_at.unwrap_or(sale.sale_date);
        let mut destocked = Vec::with_capacity(changes.len());
        for item in sale.lines.items() {
            if !changes.iter().any(|c| c.product.id() == item.product_id) {
                return Err(RepositoryError::NotFound);
            }
            let stored = tables
                .products
                .get(&item.product_id.as_i32())
                .ok_or(RepositoryError::NotFound)?;
            let change = stored
                .reduce_stock(item.quantity, now)
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
            destocked.push(change.product);
        }
        for product in destocked {
            tables.products.insert(product.id().as_i32(), product);
        }
        tables.sales.insert(sale.id.as_i32(), sale.clone());
        Ok(())
    }

    async fn list_sales(&self, query: &SaleListQuery) -> Result<Page<Sale>, RepositoryError> {
        let tables = self.tables.lock().await;
        let sort = query.sort();
        let direction = query.direction();
        let mut matching: Vec<&Sale> = tables.sales.values().filter(|s| query.matches(s)).collect();
        matching.sort_by(|a, b| directed(compare_sales(sort, a, b), direction));
        let matching: Vec<Sale> = matching.into_iter().cloned().collect();
        Ok(Page::new(
            paginate(&matching, &query.page),
            &query.page,
            matching.len() as u64,
        ))
    }

    async fn sales_summary(&self) -> Result<SalesSummary, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(SalesSummary::from_sales(
            tables.sales.values().filter(|s| !s.lifecycle.is_deleted()),
        ))
    }

    async fn completed_sales_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sales
            .values()
            .filter(|s| {
                s.status == SaleStatus::Completed
                    && !s.lifecycle.is_deleted()
                    && s.sale_date >= since
            })
            .map(|s| SaleRecord {
                sale_id: s.id,
                sale_date: s.sale_date,
                status: s.status,
                final_amount: s.final_amount(),
                city: s.details.customer.city.clone(),
                state: s.details.customer.state.clone(),
                country: s.details.customer.country.clone(),
                lines: s
                    .lines
                    .items()
                    .iter()
                    .map(|item| SoldLine {
                        product_id: item.product_id,
                        product_name: item.product_name.clone(),
                        category_name: tables.category_name_for(item.product_id),
                        quantity: item.quantity,
                        line_total: item.line_total,
                    })
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use emporium_core::category::CategoryDetails;
    use emporium_core::governance::Dimensions;
    use emporium_core::product::{ProductDetails, ProductIdentifiers};
    use emporium_core::sale::SaleDetails;
    use emporium_core::{PageRequest, PriceBounds};
    use rust_decimal::dec;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn details(name: &str, sku: &str, category_id: CategoryId) -> ProductDetails {
        ProductDetails {
            name: name.to_string(),
            description: None,
            price: dec!(10.00),
            sku: sku.to_string(),
            stock_quantity: 5,
            image_url: None,
            category_id,
            dimensions: Dimensions::default(),
            is_hazmat: false,
            safety_data_sheet_url: None,
            price_bounds: PriceBounds::default(),
            key_features: None,
            identifiers: ProductIdentifiers::default(),
            inventory_location: None,
        }
    }

    async fn seeded() -> (MemoryCatalogStore, CategoryId) {
        let store = MemoryCatalogStore::new();
        let category = store
            .insert_category(
                NewCategory::new(CategoryDetails::new("Office", None), now()).unwrap(),
            )
            .await
            .unwrap();
        (store, category.id)
    }

    #[tokio::test]
    async fn test_sku_is_unique_case_insensitively() {
        let (store, category) = seeded().await;
        store
            .insert_product(NewProduct::evaluate(details("Desk", "DESK-1", category), now()).unwrap())
            .await
            .unwrap();
        let err = store
            .insert_product(NewProduct::evaluate(details("Desk 2", "desk-1", category), now()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(store.find_product_by_sku(" Desk-1 ").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_category_name_unique_among_live_categories() {
        let (store, _) = seeded().await;
        let dup = NewCategory::new(CategoryDetails::new("OFFICE", None), now()).unwrap();
        assert!(matches!(
            store.insert_category(dup.clone()).await,
            Err(RepositoryError::Conflict(_))
        ));

        let existing = store.find_category_by_name("office").await.unwrap().unwrap();
        store
            .update_category(&existing.soft_deleted(now()))
            .await
            .unwrap();
        assert!(store.insert_category(dup).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_products_filters_sorts_and_pages() {
        let (store, category) = seeded().await;
        for (name, sku) in [("Chair", "CH-1"), ("Lamp", "LA-1"), ("Bookcase", "BO-1")] {
            store
                .insert_product(NewProduct::evaluate(details(name, sku, category), now()).unwrap())
                .await
                .unwrap();
        }

        let query = ProductListQuery::new(
            PageRequest::new(1, 2).sorted_by("name", SortDirection::Asc),
        );
        let page = store.list_products(&query).await.unwrap();
        assert_eq!(page.total_items, 3);
        assert!(page.has_next_page());
        let names: Vec<&str> = page.items.iter().map(Product::name).collect();
        assert_eq!(names, ["Bookcase", "Chair"]);

        let query = ProductListQuery {
            search: Some("lam".to_string()),
            ..ProductListQuery::default()
        };
        assert_eq!(store.list_products(&query).await.unwrap().total_items, 1);
    }

    #[tokio::test]
    async fn test_price_change_is_appended_with_product() {
        let (store, category) = seeded().await;
        let product = store
            .insert_product(NewProduct::evaluate(details("Desk", "DESK-1", category), now()).unwrap())
            .await
            .unwrap();
        let change = NewPriceHistory::new(product.id(), dec!(10.00), dec!(12.00), now());
        store.update_product(&product, Some(&change)).await.unwrap();

        let history = store.price_history(product.id()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.first().unwrap().new_price, dec!(12.00));
    }

    #[tokio::test]
    async fn test_completed_sales_carry_category_names() {
        let (store, category) = seeded().await;
        let product = store
            .insert_product(NewProduct::evaluate(details("Desk", "DESK-1", category), now()).unwrap())
            .await
            .unwrap();
        let mut sale = NewSale::new("SALE-1".to_string(), SaleDetails::default(), now()).unwrap();
        sale.add_item(&product, 2).unwrap();
        let mut sale = store.insert_sale(sale).await.unwrap();
        assert!(store.product_has_sales(product.id()).await.unwrap());

        let changes = sale.complete(&[product], now()).unwrap();
        store.complete_sale(&sale, &changes).await.unwrap();

        let records = store.completed_sales_since(now()).await.unwrap();
        assert_eq!(records.len(), 1);
        let line = records.first().unwrap().lines.first().unwrap();
        assert_eq!(line.category_name, "Office");
        assert_eq!(line.line_total, dec!(20.00));
    }

    #[tokio::test]
    async fn test_completions_from_one_snapshot_both_take_stock() {
        let (store, category) = seeded().await;
        let snapshot = store
            .insert_product(NewProduct::evaluate(details("Desk", "DESK-1", category), now()).unwrap())
            .await
            .unwrap();

        let mut sales = Vec::new();
        for (number, quantity) in [("SALE-1", 2), ("SALE-2", 2), ("SALE-3", 2)] {
            let mut sale =
                NewSale::new(number.to_string(), SaleDetails::default(), now()).unwrap();
            sale.add_item(&snapshot, quantity).unwrap();
            let mut sale = store.insert_sale(sale).await.unwrap();
            let changes = sale.complete(&[snapshot.clone()], now()).unwrap();
            sales.push((sale, changes));
        }

        for (sale, changes) in &sales[..2] {
            store.complete_sale(sale, changes).await.unwrap();
        }
        let stored = store.get_product(snapshot.id(), false).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity(), 1);

        let (third, changes) = &sales[2];
        assert!(matches!(
            store.complete_sale(third, changes).await,
            Err(RepositoryError::Conflict(_))
        ));
        let stored = store.get_product(snapshot.id(), false).await.unwrap().unwrap();
        assert_eq!(stored.stock_quantity(), 1);
        let pending = store.get_sale(third.id).await.unwrap().unwrap();
        assert_eq!(pending.status, emporium_core::SaleStatus::Pending);
    }
}
