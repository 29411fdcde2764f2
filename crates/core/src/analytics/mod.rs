//! Sales trend reporting.
//!
//! The report is a template filler over the last 30 days of completed sales,
//! not a statistical model: no seasonality, no confidence intervals. Input is
//! a flat list of [`SaleRecord`]s so any store can feed it.

mod report;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, SaleId, SaleStatus};

pub use report::{
    CategoryPerformance, DailyRevenue, Forecast, LocationPerformance, ProductPerformance,
    Recommendations, TrendDirection, TrendReport, WINDOW_DAYS,
};

/// One line of a sale as seen by the reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub category_name: String,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// A sale with its lines, category names and customer location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_id: SaleId,
    pub sale_date: DateTime<Utc>,
    pub status: SaleStatus,
    pub final_amount: Decimal,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lines: Vec<SoldLine>,
}

/// Format an amount as US dollars with thousands separators, e.g.
/// `$1,234.56` or `-$3.10`.
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
        assert_eq!(format_currency(dec!(5)), "$5.00");
        assert_eq!(format_currency(dec!(999.999)), "$1,000.00");
        assert_eq!(format_currency(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_currency(dec!(-3.1)), "-$3.10");
        assert_eq!(format_currency(dec!(123456)), "$123,456.00");
    }
}
