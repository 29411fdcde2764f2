//! List query parameters shared by stores, services and the cache.

use chrono::{DateTime, Utc};
use emporium_core::product::Product;
use emporium_core::sale::Sale;
use emporium_core::{CategoryId, PageRequest, SaleStatus, SortDirection};
use serde::{Deserialize, Serialize};

/// Column a product list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Id,
    Name,
    Price,
    Sku,
    StockQuantity,
    ListingQualityScore,
    CreatedAt,
}

impl ProductSort {
    /// Unknown or missing fields sort by id.
    #[must_use]
    pub fn parse(field: Option<&str>) -> Self {
        match field.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("name") => Self::Name,
            Some("price") => Self::Price,
            Some("sku") => Self::Sku,
            Some("stock" | "stock_quantity" | "stockquantity") => Self::StockQuantity,
            Some("score" | "listing_quality_score" | "listingqualityscore") => {
                Self::ListingQualityScore
            }
            Some("created" | "created_at" | "createdat") => Self::CreatedAt,
            _ => Self::Id,
        }
    }

    /// SQL column for the sort key.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Sku => "sku",
            Self::StockQuantity => "stock_quantity",
            Self::ListingQualityScore => "listing_quality_score",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Filters and paging for the product list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductListQuery {
    pub page: PageRequest,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of name, description or SKU.
    pub search: Option<String>,
    /// `Some(true)` lists only active products, `Some(false)` only inactive.
    pub is_active: Option<bool>,
}

impl ProductListQuery {
    #[must_use]
    pub fn new(page: PageRequest) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sort(&self) -> ProductSort {
        ProductSort::parse(self.page.sort_by.as_deref())
    }

    /// Trimmed, non-empty search term.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether a non-deleted product passes the filters.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if product.is_deleted() {
            return false;
        }
        if self.category_id.is_some_and(|id| product.category_id() != id) {
            return false;
        }
        if self.is_active.is_some_and(|active| product.is_active() != active) {
            return false;
        }
        self.search_term().is_none_or(|term| {
            let term = term.to_lowercase();
            let details = product.details();
            details.name.to_lowercase().contains(&term)
                || details.sku.to_lowercase().contains(&term)
                || details
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&term))
        })
    }
}

/// Column a sale list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaleSort {
    #[default]
    SaleDate,
    SaleNumber,
    FinalAmount,
}

impl SaleSort {
    #[must_use]
    pub fn parse(field: Option<&str>) -> Self {
        match field.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("sale_number" | "salenumber" | "number") => Self::SaleNumber,
            Some("final_amount" | "finalamount" | "amount") => Self::FinalAmount,
            _ => Self::SaleDate,
        }
    }

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::SaleDate => "sale_date",
            Self::SaleNumber => "sale_number",
            Self::FinalAmount => "final_amount",
        }
    }
}

/// Filters and paging for the sale list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleListQuery {
    pub page: PageRequest,
    pub status: Option<SaleStatus>,
    /// Case-insensitive substring of the customer name.
    pub customer: Option<String>,
    /// Inclusive lower bound on the sale date.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the sale date.
    pub to: Option<DateTime<Utc>>,
}

impl SaleListQuery {
    #[must_use]
    pub fn sort(&self) -> SaleSort {
        SaleSort::parse(self.page.sort_by.as_deref())
    }

    /// Newest first unless the caller picked a sort field.
    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        match self.page.sort_by {
            Some(_) => self.page.sort_direction,
            None => SortDirection::Desc,
        }
    }

    #[must_use]
    pub fn customer_term(&self) -> Option<&str> {
        self.customer.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn matches(&self, sale: &Sale) -> bool {
        if sale.lifecycle.is_deleted() {
            return false;
        }
        if self.status.is_some_and(|s| sale.status != s) {
            return false;
        }
        if self.from.is_some_and(|from| sale.sale_date < from)
            || self.to.is_some_and(|to| sale.sale_date > to)
        {
            return false;
        }
        self.customer_term().is_none_or(|term| {
            sale.details
                .customer
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&term.to_lowercase()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_sort_parse() {
        assert_eq!(ProductSort::parse(Some(" Price ")), ProductSort::Price);
        assert_eq!(ProductSort::parse(Some("stockQuantity")), ProductSort::StockQuantity);
        assert_eq!(ProductSort::parse(Some("drop table")), ProductSort::Id);
        assert_eq!(ProductSort::parse(None).column(), "id");
    }

    #[test]
    fn test_sale_default_order_is_newest_first() {
        let query = SaleListQuery::default();
        assert_eq!(query.sort(), SaleSort::SaleDate);
        assert_eq!(query.direction(), SortDirection::Desc);

        let query = SaleListQuery {
            page: PageRequest::new(1, 10).sorted_by("amount", SortDirection::Asc),
            ..SaleListQuery::default()
        };
        assert_eq!(query.sort(), SaleSort::FinalAmount);
        assert_eq!(query.direction(), SortDirection::Asc);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ProductListQuery {
            search: Some("   ".to_string()),
            ..ProductListQuery::default()
        };
        assert_eq!(query.search_term(), None);
    }
}
