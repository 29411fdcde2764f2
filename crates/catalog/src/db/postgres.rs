//! `PostgreSQL` implementation of [`CatalogStore`].
//!
//! Queries are runtime-checked (`query_as::<_, Row>`) so the crate builds
//! without a live database. Listing filters are bound as nullable parameters;
//! only the whitelisted ORDER BY column is formatted into SQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emporium_core::analytics::{SaleRecord, SoldLine};
use emporium_core::category::{Category, CategorySummary, NewCategory};
use emporium_core::governance::Dimensions;
use emporium_core::price_history::{NewPriceHistory, PriceHistory};
use emporium_core::product::{NewProduct, Product, ProductChange, ProductDetails, ProductIdentifiers};
use emporium_core::sale::{
    Customer, NewSale, PaymentInfo, Sale, SaleDetails, SaleItem, SaleLines, SalesSummary,
    StatusTotal,
};
use emporium_core::{
    CategoryId, Lifecycle, Page, PaymentMethod, PaymentStatus, PriceBounds, PriceHistoryId,
    ProductId, ProductStatus, SaleId, SaleStatus,
};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use super::{CatalogStore, RepositoryError};
use crate::query::{ProductListQuery, SaleListQuery};

macro_rules! category_select {
    () => {
        "SELECT id, name, description, created_at, updated_at, deleted_at FROM category"
    };
}

macro_rules! product_select {
    () => {
        r"SELECT id, name, description, price, sku, stock_quantity, image_url, category_id,
                 weight, length, width, height, is_hazmat, safety_data_sheet_url,
                 floor_price, ceiling_price, key_features, upc, gtin, isbn,
                 inventory_location, status, created_at, updated_at, deleted_at
          FROM product"
    };
}

macro_rules! product_filters {
    () => {
        r" WHERE deleted_at IS NULL
             AND ($1::INTEGER IS NULL OR category_id = $1)
             AND ($2::TEXT IS NULL OR name ILIKE $2 OR sku ILIKE $2 OR description ILIKE $2)
             AND ($3::BOOLEAN IS NULL OR (status = 'active') = $3)"
    };
}

macro_rules! sale_select {
    () => {
        r"SELECT id, sale_number, sale_date, status, tax_amount, discount_amount,
                 customer_name, customer_email, customer_city, customer_state,
                 customer_country, notes, created_at, updated_at, deleted_at
          FROM sale"
    };
}

macro_rules! sale_filters {
    () => {
        r" WHERE deleted_at IS NULL
             AND ($1::sale_status IS NULL OR status = $1)
             AND ($2::TEXT IS NULL OR customer_name ILIKE $2)
             AND ($3::TIMESTAMPTZ IS NULL OR sale_date >= $3)
             AND ($4::TIMESTAMPTZ IS NULL OR sale_date <= $4)"
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            lifecycle: Lifecycle {
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategorySummaryRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    product_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    sku: String,
    stock_quantity: i32,
    image_url: Option<String>,
    category_id: i32,
    weight: f64,
    length: f64,
    width: f64,
    height: f64,
    is_hazmat: bool,
    safety_data_sheet_url: Option<String>,
    floor_price: Option<Decimal>,
    ceiling_price: Option<Decimal>,
    key_features: Option<String>,
    upc: Option<String>,
    gtin: Option<String>,
    isbn: Option<String>,
    inventory_location: Option<String>,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let details = ProductDetails {
            name: row.name,
            description: row.description,
            price: row.price,
            sku: row.sku,
            stock_quantity: row.stock_quantity,
            image_url: row.image_url,
            category_id: CategoryId::new(row.category_id),
            dimensions: Dimensions::new(row.weight, row.length, row.width, row.height),
            is_hazmat: row.is_hazmat,
            safety_data_sheet_url: row.safety_data_sheet_url,
            price_bounds: PriceBounds::new(row.floor_price, row.ceiling_price),
            key_features: row.key_features,
            identifiers: ProductIdentifiers {
                upc: row.upc,
                gtin: row.gtin,
                isbn: row.isbn,
            },
            inventory_location: row.inventory_location,
        };
        Self::from_stored(
            ProductId::new(row.id),
            details,
            row.status,
            Lifecycle {
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
            },
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PriceHistoryRow {
    id: i32,
    product_id: i32,
    old_price: Decimal,
    new_price: Decimal,
    changed_at: DateTime<Utc>,
}

impl From<PriceHistoryRow> for PriceHistory {
    fn from(row: PriceHistoryRow) -> Self {
        Self {
            id: PriceHistoryId::new(row.id),
            product_id: ProductId::new(row.product_id),
            old_price: row.old_price,
            new_price: row.new_price,
            changed_at: row.changed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i32,
    sale_number: String,
    sale_date: DateTime<Utc>,
    status: SaleStatus,
    tax_amount: Decimal,
    discount_amount: Decimal,
    customer_name: Option<String>,
    customer_email: Option<String>,
    customer_city: Option<String>,
    customer_state: Option<String>,
    customer_country: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    sale_id: i32,
    product_id: i32,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    sale_id: i32,
    method: PaymentMethod,
    amount: Decimal,
    status: PaymentStatus,
    transaction_id: Option<String>,
    payment_reference: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<PaymentRow> for PaymentInfo {
    fn from(row: PaymentRow) -> Self {
        Self {
            method: row.method,
            amount: row.amount,
            status: row.status,
            transaction_id: row.transaction_id,
            payment_reference: row.payment_reference,
            processed_at: row.processed_at,
            notes: row.notes,
            lifecycle: Lifecycle {
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
            },
        }
    }
}

fn build_sale(
    row: SaleRow,
    items: Vec<SaleItem>,
    payment: Option<PaymentInfo>,
) -> Result<Sale, RepositoryError> {
    let lines = SaleLines::from_stored(items, row.tax_amount, row.discount_amount).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid amounts on sale {}: {e}", row.id))
    })?;
    Ok(Sale {
        id: SaleId::new(row.id),
        sale_number: row.sale_number,
        sale_date: row.sale_date,
        status: row.status,
        details: SaleDetails {
            customer: Customer {
                name: row.customer_name,
                email: row.customer_email,
                city: row.customer_city,
                state: row.customer_state,
                country: row.customer_country,
            },
            notes: row.notes,
            tax_amount: row.tax_amount,
            discount_amount: row.discount_amount,
        },
        lines,
        payment,
        lifecycle: Lifecycle {
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        },
    })
}

#[derive(Debug, sqlx::FromRow)]
struct StatusTotalRow {
    status: SaleStatus,
    count: i64,
    total_amount: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CompletedSaleRow {
    id: i32,
    sale_date: DateTime<Utc>,
    final_amount: Decimal,
    customer_city: Option<String>,
    customer_state: Option<String>,
    customer_country: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SoldLineRow {
    sale_id: i32,
    product_id: i32,
    product_name: String,
    category_name: String,
    quantity: i32,
    line_total: Decimal,
}

// =============================================================================
// Helpers
// =============================================================================

fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn map_write_error(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

async fn write_product(conn: &mut PgConnection, product: &Product) -> Result<(), RepositoryError> {
    let d = product.details();
    let result = sqlx::query(
        r"
        UPDATE product SET
            name = $2, description = $3, price = $4, sku = $5, stock_quantity = $6,
            image_url = $7, category_id = $8, weight = $9, length = $10, width = $11,
            height = $12, is_hazmat = $13, safety_data_sheet_url = $14,
            floor_price = $15, ceiling_price = $16, key_features = $17,
            upc = $18, gtin = $19, isbn = $20, inventory_location = $21,
            listing_quality_score = $22, status = $23,
            updated_at = $24, deleted_at = $25
        WHERE id = $1
        ",
    )
    .bind(product.id().as_i32())
    .bind(d.name.as_str())
    .bind(d.description.as_deref())
    .bind(d.price)
    .bind(d.sku.trim())
    .bind(d.stock_quantity)
    .bind(d.image_url.as_deref())
    .bind(d.category_id.as_i32())
    .bind(d.dimensions.weight)
    .bind(d.dimensions.length)
    .bind(d.dimensions.width)
    .bind(d.dimensions.height)
    .bind(d.is_hazmat)
    .bind(d.safety_data_sheet_url.as_deref())
    .bind(d.price_bounds.floor)
    .bind(d.price_bounds.ceiling)
    .bind(d.key_features.as_deref())
    .bind(d.identifiers.upc.as_deref())
    .bind(d.identifiers.gtin.as_deref())
    .bind(d.identifiers.isbn.as_deref())
    .bind(d.inventory_location.as_deref())
    .bind(i32::from(product.listing_quality_score()))
    .bind(product.status())
    .bind(product.lifecycle().updated_at)
    .bind(product.lifecycle().deleted_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_write_error(e, "sku already exists"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Decrement stock relative to the stored level. Fails with `Conflict`, and
/// rolls the caller's transaction back, when the row holds fewer than
/// `quantity` units.
async fn take_stock(
    conn: &mut PgConnection,
    product: &Product,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE product SET
            stock_quantity = stock_quantity - $2,
            listing_quality_score = $3, status = $4, updated_at = $5
        WHERE id = $1 AND stock_quantity >= $2
        ",
    )
    .bind(product.id().as_i32())
    .bind(quantity)
    .bind(i32::from(product.listing_quality_score()))
    .bind(product.status())
    .bind(product.lifecycle().updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "insufficient stock for product {}",
            product.id()
        )));
    }
    Ok(())
}

async fn write_sale_items(
    conn: &mut PgConnection,
    sale_id: SaleId,
    items: &[SaleItem],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM sale_item WHERE sale_id = $1")
        .bind(sale_id.as_i32())
        .execute(&mut *conn)
        .await?;

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO sale_item
                (sale_id, position, product_id, product_name, quantity, unit_price, line_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(sale_id.as_i32())
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .bind(item.product_id.as_i32())
        .bind(item.product_name.as_str())
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_write_error(e, "duplicate sale line"))?;
    }
    Ok(())
}

async fn write_sale(conn: &mut PgConnection, sale: &Sale) -> Result<(), RepositoryError> {
    let customer = &sale.details.customer;
    let result = sqlx::query(
        r"
        UPDATE sale SET
            status = $2, total_amount = $3, tax_amount = $4, discount_amount = $5,
            final_amount = $6, customer_name = $7, customer_email = $8,
            customer_city = $9, customer_state = $10, customer_country = $11,
            notes = $12, updated_at = $13, deleted_at = $14
        WHERE id = $1
        ",
    )
    .bind(sale.id.as_i32())
    .bind(sale.status)
    .bind(sale.lines.total_amount())
    .bind(sale.lines.tax_amount())
    .bind(sale.lines.discount_amount())
    .bind(sale.lines.final_amount())
    .bind(customer.name.as_deref())
    .bind(customer.email.as_deref())
    .bind(customer.city.as_deref())
    .bind(customer.state.as_deref())
    .bind(customer.country.as_deref())
    .bind(sale.details.notes.as_deref())
    .bind(sale.lifecycle.updated_at)
    .bind(sale.lifecycle.deleted_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    write_sale_items(conn, sale.id, sale.lines.items()).await?;

    match &sale.payment {
        Some(payment) => {
            sqlx::query(
                r"
                INSERT INTO payment_info
                    (sale_id, method, amount, status, transaction_id, payment_reference,
                     processed_at, notes, created_at, updated_at, deleted_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (sale_id) DO UPDATE SET
                    method = EXCLUDED.method,
                    amount = EXCLUDED.amount,
                    status = EXCLUDED.status,
                    transaction_id = EXCLUDED.transaction_id,
                    payment_reference = EXCLUDED.payment_reference,
                    processed_at = EXCLUDED.processed_at,
                    notes = EXCLUDED.notes,
                    updated_at = EXCLUDED.updated_at,
                    deleted_at = EXCLUDED.deleted_at
                ",
            )
            .bind(sale.id.as_i32())
            .bind(payment.method)
            .bind(payment.amount)
            .bind(payment.status)
            .bind(payment.transaction_id.as_deref())
            .bind(payment.payment_reference.as_deref())
            .bind(payment.processed_at)
            .bind(payment.notes.as_deref())
            .bind(payment.lifecycle.created_at)
            .bind(payment.lifecycle.updated_at)
            .bind(payment.lifecycle.deleted_at)
            .execute(&mut *conn)
            .await?;
        }
        None => {
            sqlx::query("DELETE FROM payment_info WHERE sale_id = $1")
                .bind(sale.id.as_i32())
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

// =============================================================================
// Store
// =============================================================================

/// Catalog store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach items and payments to sale rows, preserving row order.
    async fn hydrate_sales(&self, rows: Vec<SaleRow>) -> Result<Vec<Sale>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let item_rows = sqlx::query_as::<_, SaleItemRow>(
            r"
            SELECT sale_id, product_id, product_name, quantity, unit_price, line_total
            FROM sale_item
            WHERE sale_id = ANY($1)
            ORDER BY sale_id, position
            ",
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let payment_rows = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT sale_id, method, amount, status, transaction_id, payment_reference,
                   processed_at, notes, created_at, updated_at, deleted_at
            FROM payment_info
            WHERE sale_id = ANY($1)
            ",
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<i32, Vec<SaleItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.sale_id).or_default().push(row.into());
        }
        let mut payments: HashMap<i32, PaymentInfo> = payment_rows
            .into_iter()
            .map(|row| (row.sale_id, row.into()))
            .collect();

        rows.into_iter()
            .map(|row| {
                let sale_items = items.remove(&row.id).unwrap_or_default();
                let payment = payments.remove(&row.id);
                build_sale(row, sale_items, payment)
            })
            .collect()
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn insert_category(&self, category: NewCategory) -> Result<Category, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO category (name, description, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(category.details.name.as_str())
        .bind(category.details.description.as_deref())
        .bind(category.lifecycle.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "category name already exists"))?;

        Ok(category.with_id(CategoryId::new(id)))
    }

    async fn get_category(
        &self,
        id: CategoryId,
        include_deleted: bool,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(concat!(
            category_select!(),
            " WHERE id = $1 AND ($2 OR deleted_at IS NULL)"
        ))
        .bind(id.as_i32())
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(concat!(
            category_select!(),
            " WHERE LOWER(TRIM(name)) = LOWER(TRIM($1)) AND deleted_at IS NULL"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE category
            SET name = $2, description = $3, updated_at = $4, deleted_at = $5
            WHERE id = $1
            ",
        )
        .bind(category.id.as_i32())
        .bind(category.name.as_str())
        .bind(category.description.as_deref())
        .bind(category.lifecycle.updated_at)
        .bind(category.lifecycle.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "category name already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySummaryRow>(
            r"
            SELECT c.id, c.name, c.description, c.created_at, c.updated_at, c.deleted_at,
                   COUNT(p.id) AS product_count
            FROM category c
            LEFT JOIN product p ON p.category_id = c.id AND p.deleted_at IS NULL
            WHERE c.deleted_at IS NULL
            GROUP BY c.id
            ORDER BY LOWER(c.name)
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CategorySummary {
                category: row.category.into(),
                product_count: to_count(row.product_count),
            })
            .collect())
    }

    async fn count_products_in_category(&self, id: CategoryId) -> Result<u64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM product WHERE category_id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_i32())
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(count))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let d = &product.details;
        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO product
                (name, description, price, sku, stock_quantity, image_url, category_id,
                 weight, length, width, height, is_hazmat, safety_data_sheet_url,
                 floor_price, ceiling_price, key_features, upc, gtin, isbn,
                 inventory_location, listing_quality_score, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING id
            ",
        )
        .bind(d.name.as_str())
        .bind(d.description.as_deref())
        .bind(d.price)
        .bind(d.sku.trim())
        .bind(d.stock_quantity)
        .bind(d.image_url.as_deref())
        .bind(d.category_id.as_i32())
        .bind(d.dimensions.weight)
        .bind(d.dimensions.length)
        .bind(d.dimensions.width)
        .bind(d.dimensions.height)
        .bind(d.is_hazmat)
        .bind(d.safety_data_sheet_url.as_deref())
        .bind(d.price_bounds.floor)
        .bind(d.price_bounds.ceiling)
        .bind(d.key_features.as_deref())
        .bind(d.identifiers.upc.as_deref())
        .bind(d.identifiers.gtin.as_deref())
        .bind(d.identifiers.isbn.as_deref())
        .bind(d.inventory_location.as_deref())
        .bind(i32::from(product.listing_quality_score))
        .bind(product.status)
        .bind(product.lifecycle.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "sku already exists"))?;

        Ok(product.with_id(ProductId::new(id)))
    }

    async fn get_product(
        &self,
        id: ProductId,
        include_deleted: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(concat!(
            product_select!(),
            " WHERE id = $1 AND ($2 OR deleted_at IS NULL)"
        ))
        .bind(id.as_i32())
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(concat!(
            product_select!(),
            " WHERE LOWER(TRIM(sku)) = LOWER(TRIM($1))"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn update_product(
        &self,
        product: &Product,
        price_change: Option<&NewPriceHistory>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        write_product(&mut *tx, product).await?;

        if let Some(change) = price_change {
            sqlx::query(
                r"
                INSERT INTO price_history (product_id, old_price, new_price, changed_at)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(change.product_id.as_i32())
            .bind(change.old_price)
            .bind(change.new_price)
            .bind(change.changed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> Result<Page<Product>, RepositoryError> {
        let category = query.category_id.map(|id| id.as_i32());
        let search = query.search_term().map(like_pattern);
        let direction = query.page.sort_direction.as_str();

        let total = sqlx::query_scalar::<_, i64>(concat!(
            "SELECT COUNT(*) FROM product",
            product_filters!()
        ))
        .bind(category)
        .bind(search.as_deref())
        .bind(query.is_active)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "{}{} ORDER BY {} {direction}, id {direction} LIMIT $4 OFFSET $5",
            product_select!(),
            product_filters!(),
            query.sort().column(),
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .bind(search.as_deref())
            .bind(query.is_active)
            .bind(i64::from(query.page.page_size))
            .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Product::from).collect(),
            &query.page,
            to_count(total),
        ))
    }

    async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            product_select!(),
            " WHERE deleted_at IS NULL AND status = 'active' AND stock_quantity <= $1",
            " ORDER BY stock_quantity, id"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn product_has_sales(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sale_item WHERE product_id = $1)",
        )
        .bind(id.as_i32())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn price_history(&self, id: ProductId) -> Result<Vec<PriceHistory>, RepositoryError> {
        let rows = sqlx::query_as::<_, PriceHistoryRow>(
            r"
            SELECT id, product_id, old_price, new_price, changed_at
            FROM price_history
            WHERE product_id = $1
            ORDER BY changed_at DESC, id DESC
            ",
        )
        .bind(id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PriceHistory::from).collect())
    }

    async fn insert_sale(&self, sale: NewSale) -> Result<Sale, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let customer = &sale.details.customer;

        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO sale
                (sale_number, sale_date, status, total_amount, tax_amount, discount_amount,
                 final_amount, customer_name, customer_email, customer_city,
                 customer_state, customer_country, notes, created_at)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            ",
        )
        .bind(sale.sale_number.as_str())
        .bind(sale.sale_date)
        .bind(sale.lines.total_amount())
        .bind(sale.lines.tax_amount())
        .bind(sale.lines.discount_amount())
        .bind(sale.lines.final_amount())
        .bind(customer.name.as_deref())
        .bind(customer.email.as_deref())
        .bind(customer.city.as_deref())
        .bind(customer.state.as_deref())
        .bind(customer.country.as_deref())
        .bind(sale.details.notes.as_deref())
        .bind(sale.lifecycle.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "sale number already exists"))?;

        let sale_id = SaleId::new(id);
        write_sale_items(&mut *tx, sale_id, sale.lines.items()).await?;
        tx.commit().await?;

        Ok(sale.with_id(sale_id))
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        let row = sqlx::query_as::<_, SaleRow>(concat!(
            sale_select!(),
            " WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate_sales(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn update_sale(&self, sale: &Sale) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        write_sale(&mut *tx, sale).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn complete_sale(
        &self,
        sale: &Sale,
        changes: &[ProductChange],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for item in sale.lines.items() {
            let product = changes
                .iter()
                .map(|c| &c.product)
                .find(|p| p.id() == item.product_id)
                .ok_or(RepositoryError::NotFound)?;
            take_stock(&mut *tx, product, item.quantity).await?;
        }
        write_sale(&mut *tx, sale).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_sales(&self, query: &SaleListQuery) -> Result<Page<Sale>, RepositoryError> {
        let customer = query.customer_term().map(like_pattern);
        let direction = query.direction().as_str();

        let total = sqlx::query_scalar::<_, i64>(concat!("SELECT COUNT(*) FROM sale", sale_filters!()))
            .bind(query.status)
            .bind(customer.as_deref())
            .bind(query.from)
            .bind(query.to)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "{}{} ORDER BY {} {direction}, id {direction} LIMIT $5 OFFSET $6",
            sale_select!(),
            sale_filters!(),
            query.sort().column(),
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(query.status)
            .bind(customer.as_deref())
            .bind(query.from)
            .bind(query.to)
            .bind(i64::from(query.page.page_size))
            .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            self.hydrate_sales(rows).await?,
            &query.page,
            to_count(total),
        ))
    }

    async fn sales_summary(&self) -> Result<SalesSummary, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusTotalRow>(
            r"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(final_amount), 0) AS total_amount
            FROM sale
            WHERE deleted_at IS NULL
            GROUP BY status
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesSummary::from_totals(
            rows.into_iter()
                .map(|row| StatusTotal {
                    status: row.status,
                    count: to_count(row.count),
                    total_amount: row.total_amount,
                })
                .collect(),
        ))
    }

    async fn completed_sales_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, RepositoryError> {
        let sales = sqlx::query_as::<_, CompletedSaleRow>(
            r"
            SELECT id, sale_date, final_amount, customer_city, customer_state, customer_country
            FROM sale
            WHERE status = 'completed' AND deleted_at IS NULL AND sale_date >= $1
            ORDER BY sale_date, id
            ",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let line_rows = sqlx::query_as::<_, SoldLineRow>(
            r"
            SELECT si.sale_id, si.product_id, si.product_name, si.quantity, si.line_total,
                   COALESCE(c.name, 'Uncategorized') AS category_name
            FROM sale_item si
            JOIN sale s ON s.id = si.sale_id
            LEFT JOIN product p ON p.id = si.product_id
            LEFT JOIN category c ON c.id = p.category_id
            WHERE s.status = 'completed' AND s.deleted_at IS NULL AND s.sale_date >= $1
            ORDER BY si.sale_id, si.position
            ",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<i32, Vec<SoldLine>> = HashMap::new();
        for row in line_rows {
            lines.entry(row.sale_id).or_default().push(SoldLine {
                product_id: ProductId::new(row.product_id),
                product_name: row.product_name,
                category_name: row.category_name,
                quantity: row.quantity,
                line_total: row.line_total,
            });
        }

        Ok(sales
            .into_iter()
            .map(|row| SaleRecord {
                sale_id: SaleId::new(row.id),
                sale_date: row.sale_date,
                status: SaleStatus::Completed,
                final_amount: row.final_amount,
                city: row.customer_city,
                state: row.customer_state,
                country: row.customer_country,
                lines: lines.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }
}
