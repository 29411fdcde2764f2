use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::{SaleRecord, format_currency};
use crate::types::{ProductId, SaleStatus};

/// Days of sales history the report looks at.
pub const WINDOW_DAYS: i64 = 30;
/// Days in the forecast horizon and in each week-over-week bucket.
const WEEK_DAYS: i64 = 7;
const TOP_PRODUCTS: usize = 5;
const TOP_LOCATIONS: usize = 10;
/// Week-over-week swings beyond this fraction count as a trend.
const TREND_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Revenue for one calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPerformance {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPerformance {
    pub category_name: String,
    pub revenue: Decimal,
}

/// Revenue for a `"city, state, country"` location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationPerformance {
    pub location: String,
    pub revenue: Decimal,
    pub sale_count: u64,
}

/// Direction of the least-squares line through daily revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    InsufficientData,
    Flat,
    Uptrend,
    Downtrend,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InsufficientData => "insufficient data",
            Self::Flat => "flat",
            Self::Uptrend => "uptrend",
            Self::Downtrend => "downtrend",
        })
    }
}

/// Next-week revenue projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Forecast {
    /// `max(0, revenue_30d / 30 * 7)`, zero with fewer than two sales.
    pub predicted_revenue: Decimal,
    pub trend: TrendDirection,
}

/// Product, price, place and promotion suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub product: String,
    pub price: String,
    pub place: String,
    pub promotion: String,
}

/// The full trend report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendReport {
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    /// Last 7 days against the 7 before, as a fraction (`2` is +200%).
    /// `None` when the earlier week had no revenue.
    pub weekly_change: Option<Decimal>,
    pub revenue_last_30_days: Decimal,
    pub revenue_last_7_days: Decimal,
    pub recommendations: Recommendations,
    pub daily_sales: Vec<DailyRevenue>,
    pub forecast: Forecast,
    pub top_products: Vec<ProductPerformance>,
    pub category_revenue: Vec<CategoryPerformance>,
    pub locations: Vec<LocationPerformance>,
}

impl TrendReport {
    /// Build the report as of `now`. Sales that are not completed or fall
    /// outside the last [`WINDOW_DAYS`] days are ignored.
    #[must_use]
    pub fn generate(sales: &[SaleRecord], now: DateTime<Utc>) -> Self {
        let window_start = now - Duration::days(WINDOW_DAYS);
        let sales: Vec<&SaleRecord> = sales
            .iter()
            .filter(|s| {
                s.status == SaleStatus::Completed && s.sale_date >= window_start && s.sale_date <= now
            })
            .collect();

        let week_start = now - Duration::days(WEEK_DAYS);
        let prior_week_start = now - Duration::days(2 * WEEK_DAYS);
        let revenue_last_30_days = sum_final(sales.iter().copied());
        let revenue_last_7_days = sum_final(sales.iter().copied().filter(|s| s.sale_date >= week_start));
        let revenue_prior_7_days = sum_final(
            sales
                .iter()
                .copied()
                .filter(|s| s.sale_date >= prior_week_start && s.sale_date < week_start),
        );
        let weekly_change = (revenue_prior_7_days > Decimal::ZERO)
            .then(|| (revenue_last_7_days - revenue_prior_7_days) / revenue_prior_7_days);

        let daily_sales = daily_series(&sales);
        let top_products = top_products(&sales);
        let locations = top_locations(&sales);
        let forecast = Forecast {
            predicted_revenue: forecast_revenue(sales.len(), revenue_last_30_days),
            trend: trend_direction(sales.len(), &daily_sales, window_start.date_naive()),
        };

        let summary = summary(
            revenue_last_30_days,
            revenue_last_7_days,
            weekly_change,
            top_products.first(),
            &forecast,
        );
        let recommendations = recommendations(top_products.first(), locations.first());

        Self {
            generated_at: now,
            summary,
            weekly_change,
            revenue_last_30_days,
            revenue_last_7_days,
            recommendations,
            daily_sales,
            forecast,
            top_products,
            category_revenue: category_revenue(&sales),
            locations,
        }
    }
}

fn sum_final<'a>(sales: impl Iterator<Item = &'a SaleRecord>) -> Decimal {
    sales.map(|s| s.final_amount).sum()
}

fn forecast_revenue(sale_count: usize, revenue: Decimal) -> Decimal {
    if sale_count < 2 {
        return Decimal::ZERO;
    }
    (revenue / Decimal::from(WINDOW_DAYS) * Decimal::from(WEEK_DAYS)).max(Decimal::ZERO)
}

/// Sign of the least-squares slope of daily revenue against days since the
/// window start.
fn trend_direction(sale_count: usize, daily: &[DailyRevenue], start: NaiveDate) -> TrendDirection {
    if sale_count < 2 {
        return TrendDirection::InsufficientData;
    }
    #[allow(clippy::cast_precision_loss)]
    let points: Vec<(f64, f64)> = daily
        .iter()
        .map(|d| {
            let x = (d.date - start).num_days() as f64;
            (x, d.total.to_f64().unwrap_or_default())
        })
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.0).sum();
    let sum_y: f64 = points.iter().map(|p| p.1).sum();
    let sum_xy: f64 = points.iter().map(|p| p.0 * p.1).sum();
    let sum_x2: f64 = points.iter().map(|p| p.0 * p.0).sum();

    let denominator = n.mul_add(sum_x2, -(sum_x * sum_x));
    if denominator.abs() < 1e-4 {
        return TrendDirection::Flat;
    }
    let slope = n.mul_add(sum_xy, -(sum_x * sum_y)) / denominator;
    if slope.abs() < f64::EPSILON {
        TrendDirection::Flat
    } else if slope > 0.0 {
        TrendDirection::Uptrend
    } else {
        TrendDirection::Downtrend
    }
}

fn daily_series(sales: &[&SaleRecord]) -> Vec<DailyRevenue> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for sale in sales {
        *by_day.entry(sale.sale_date.date_naive()).or_default() += sale.final_amount;
    }
    by_day
        .into_iter()
        .map(|(date, total)| DailyRevenue { date, total })
        .collect()
}

fn top_products(sales: &[&SaleRecord]) -> Vec<ProductPerformance> {
    let mut by_product: HashMap<ProductId, ProductPerformance> = HashMap::new();
    for line in sales.iter().flat_map(|s| &s.lines) {
        let entry = by_product
            .entry(line.product_id)
            .or_insert_with(|| ProductPerformance {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity_sold: 0,
                revenue: Decimal::ZERO,
            });
        entry.quantity_sold += i64::from(line.quantity);
        entry.revenue += line.line_total;
    }
    let mut products: Vec<_> = by_product.into_values().collect();
    products.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_id.as_i32().cmp(&b.product_id.as_i32()))
    });
    products.truncate(TOP_PRODUCTS);
    products
}

fn category_revenue(sales: &[&SaleRecord]) -> Vec<CategoryPerformance> {
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    for line in sales.iter().flat_map(|s| &s.lines) {
        *by_category.entry(line.category_name.as_str()).or_default() += line.line_total;
    }
    let mut categories: Vec<_> = by_category
        .into_iter()
        .map(|(name, revenue)| CategoryPerformance {
            category_name: name.to_string(),
            revenue,
        })
        .collect();
    // Stable sort keeps names alphabetical among equal revenue.
    categories.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    categories
}

fn location_key(sale: &SaleRecord) -> Option<String> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !present(&sale.state) && !present(&sale.country) {
        return None;
    }
    let key = format!(
        "{}, {}, {}",
        sale.city.as_deref().unwrap_or_default(),
        sale.state.as_deref().unwrap_or_default(),
        sale.country.as_deref().unwrap_or_default(),
    );
    Some(key.trim_matches([',', ' ']).to_string())
}

fn top_locations(sales: &[&SaleRecord]) -> Vec<LocationPerformance> {
    let mut by_location: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    for sale in sales {
        if let Some(key) = location_key(sale) {
            let entry = by_location.entry(key).or_default();
            entry.0 += sale.final_amount;
            entry.1 += 1;
        }
    }
    let mut locations: Vec<_> = by_location
        .into_iter()
        .map(|(location, (revenue, sale_count))| LocationPerformance {
            location,
            revenue,
            sale_count,
        })
        .collect();
    locations.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    locations.truncate(TOP_LOCATIONS);
    locations
}

fn summary(
    revenue_30: Decimal,
    revenue_7: Decimal,
    weekly_change: Option<Decimal>,
    top_product: Option<&ProductPerformance>,
    forecast: &Forecast,
) -> String {
    let mut lines = vec![
        "Analysis for the last 30 days:".to_string(),
        format!(
            "- Total completed sales revenue: {}.",
            format_currency(revenue_30)
        ),
        format!("- Revenue in the last 7 days: {}.", format_currency(revenue_7)),
    ];

    if let Some(change) = weekly_change {
        let percent = (change.abs() * Decimal::ONE_HUNDRED).round_dp(1);
        lines.push(if change > TREND_THRESHOLD {
            format!(
                "- Sales are trending up, with a {percent:.1}% increase in revenue this week compared to the previous week."
            )
        } else if change < -TREND_THRESHOLD {
            format!(
                "- Sales are trending down, with a {percent:.1}% decrease in revenue this week compared to the previous week."
            )
        } else {
            "- Sales volume has remained stable over the last two weeks.".to_string()
        });
    }

    if let Some(top) = top_product {
        lines.push(format!(
            "- The top-performing product is '{}', generating {} in revenue from {} units sold.",
            top.product_name,
            format_currency(top.revenue),
            top.quantity_sold
        ));
    }

    lines.push(format!(
        "- Forecast for the next 7 days predicts a revenue of approximately {}.",
        format_currency(forecast.predicted_revenue)
    ));
    lines.join("\n")
}

fn recommendations(
    top_product: Option<&ProductPerformance>,
    top_location: Option<&LocationPerformance>,
) -> Recommendations {
    Recommendations {
        product: top_product.map_or_else(
            || "Identify and promote potential top-selling products.".to_string(),
            |p| {
                format!(
                    "Capitalize on the success of '{}'. Consider bundling it with complementary items or increasing stock.",
                    p.product_name
                )
            },
        ),
        price: "Review pricing for underperforming products. Consider offering limited-time discounts to stimulate demand.".to_string(),
        place: top_location.map_or_else(
            || "Run broad marketing campaigns to identify high-potential geographic markets.".to_string(),
            |l| {
                format!(
                    "'{}' is a key market, generating {}. Target marketing campaigns and logistics for this region.",
                    l.location,
                    format_currency(l.revenue)
                )
            },
        ),
        promotion: "Launch a promotional campaign for the top product category. Use email marketing to target repeat customers with special offers.".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal::dec;

    use super::*;
    use crate::analytics::SoldLine;
    use crate::types::SaleId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 18, 0, 0).unwrap()
    }

    fn line(product: i32, category: &str, quantity: i32, total: Decimal) -> SoldLine {
        SoldLine {
            product_id: ProductId::new(product),
            product_name: format!("Product {product}"),
            category_name: category.to_string(),
            quantity,
            line_total: total,
        }
    }

    fn sale(id: i32, days_ago: i64, amount: Decimal) -> SaleRecord {
        SaleRecord {
            sale_id: SaleId::new(id),
            sale_date: now() - Duration::days(days_ago),
            status: SaleStatus::Completed,
            final_amount: amount,
            city: None,
            state: None,
            country: None,
            lines: vec![line(1, "General", 1, amount)],
        }
    }

    #[test]
    fn test_empty_input_is_zeroed() {
        let report = TrendReport::generate(&[], now());
        assert_eq!(report.revenue_last_30_days, Decimal::ZERO);
        assert_eq!(report.forecast.predicted_revenue, Decimal::ZERO);
        assert_eq!(report.forecast.trend, TrendDirection::InsufficientData);
        assert!(report.daily_sales.is_empty());
        assert!(report.top_products.is_empty());
        assert!(report.weekly_change.is_none());
        assert_eq!(
            report.summary,
            "Analysis for the last 30 days:\n\
             - Total completed sales revenue: $0.00.\n\
             - Revenue in the last 7 days: $0.00.\n\
             - Forecast for the next 7 days predicts a revenue of approximately $0.00."
        );
        assert_eq!(
            report.recommendations.product,
            "Identify and promote potential top-selling products."
        );
    }

    #[test]
    fn test_week_over_week_trending_up() {
        let sales = vec![
            sale(1, 1, dec!(100)),
            sale(2, 2, dec!(100)),
            sale(3, 3, dec!(100)),
            sale(4, 9, dec!(60)),
            sale(5, 10, dec!(40)),
        ];
        let report = TrendReport::generate(&sales, now());
        assert_eq!(report.weekly_change, Some(dec!(2)));
        assert!(report.summary.contains(
            "- Sales are trending up, with a 200.0% increase in revenue this week compared to the previous week."
        ));
        assert_eq!(report.revenue_last_7_days, dec!(300));
        assert_eq!(
            report.forecast.predicted_revenue,
            dec!(400) / dec!(30) * dec!(7)
        );
        assert!(report.summary.contains("approximately $93.33."));
    }

    #[test]
    fn test_trending_down_and_stable() {
        let down = vec![sale(1, 1, dec!(50)), sale(2, 9, dec!(100))];
        let report = TrendReport::generate(&down, now());
        assert!(report.summary.contains(
            "- Sales are trending down, with a 50.0% decrease in revenue this week compared to the previous week."
        ));
        assert_eq!(report.forecast.trend, TrendDirection::Downtrend);

        let stable = vec![sale(1, 1, dec!(103)), sale(2, 9, dec!(100))];
        let report = TrendReport::generate(&stable, now());
        assert!(
            report
                .summary
                .contains("- Sales volume has remained stable over the last two weeks.")
        );
    }

    #[test]
    fn test_ignores_old_and_incomplete_sales() {
        let mut pending = sale(2, 1, dec!(500));
        pending.status = SaleStatus::Pending;
        let sales = vec![sale(1, 31, dec!(1000)), pending, sale(3, 2, dec!(10))];
        let report = TrendReport::generate(&sales, now());
        assert_eq!(report.revenue_last_30_days, dec!(10));
        assert_eq!(report.forecast.predicted_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_rankings() {
        let mut a = sale(1, 1, dec!(70));
        a.lines = vec![
            line(1, "Books", 2, dec!(20)),
            line(2, "Games", 1, dec!(50)),
        ];
        a.city = Some("Austin".to_string());
        a.state = Some("TX".to_string());
        a.country = Some("US".to_string());
        let mut b = sale(2, 2, dec!(30));
        b.lines = vec![line(1, "Books", 3, dec!(30))];
        b.country = Some("CA".to_string());
        let mut c = sale(3, 2, dec!(5));
        c.lines = vec![line(3, "Toys", 1, dec!(5))];
        c.city = Some("Nowhere".to_string());

        let report = TrendReport::generate(&[a, b, c], now());

        assert_eq!(report.top_products[0].product_id, ProductId::new(1));
        assert_eq!(report.top_products[0].quantity_sold, 5);
        assert_eq!(report.top_products[0].revenue, dec!(50));
        assert_eq!(report.top_products[1].product_id, ProductId::new(2));

        let categories: Vec<_> = report
            .category_revenue
            .iter()
            .map(|c| c.category_name.as_str())
            .collect();
        assert_eq!(categories, ["Books", "Games", "Toys"]);

        let locations: Vec<_> = report
            .locations
            .iter()
            .map(|l| l.location.as_str())
            .collect();
        assert_eq!(locations, ["Austin, TX, US", "CA"]);
        assert_eq!(
            report.recommendations.place,
            "'Austin, TX, US' is a key market, generating $70.00. Target marketing campaigns and logistics for this region."
        );
        assert_eq!(report.daily_sales.len(), 2);
        assert_eq!(report.daily_sales[1].total, dec!(70));
    }

    #[test]
    fn test_single_day_is_flat() {
        let sales = vec![sale(1, 1, dec!(10)), sale(2, 1, dec!(20))];
        let report = TrendReport::generate(&sales, now());
        assert_eq!(report.forecast.trend, TrendDirection::Flat);
    }

    proptest! {
        #[test]
        fn prop_forecast_formula(amounts in proptest::collection::vec(0u32..100_000, 0..20)) {
            let sales: Vec<_> = amounts
                .iter()
                .enumerate()
                .map(|(i, cents)| {
                    let id = i32::try_from(i).unwrap();
                    sale(id, i64::from(id % 29), Decimal::new(i64::from(*cents), 2))
                })
                .collect();
            let report = TrendReport::generate(&sales, now());
            let total: Decimal = sales.iter().map(|s| s.final_amount).sum();
            if sales.len() < 2 {
                prop_assert_eq!(report.forecast.predicted_revenue, Decimal::ZERO);
            } else {
                prop_assert_eq!(report.forecast.predicted_revenue, total / dec!(30) * dec!(7));
            }
        }
    }
}
