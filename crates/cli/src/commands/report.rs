//! Read-only reports.

use emporium_catalog::CatalogConfig;
use emporium_core::analytics::{TrendReport, format_currency};

use super::{CommandError, catalog, connect};

/// Print the 30-day trend report.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn trends(config: &CatalogConfig, json: bool) -> Result<(), CommandError> {
    let catalog = catalog(config, connect(config).await?);
    let report = catalog.analytics.trend_report().await?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{rendered}");
        }
    } else {
        print_trends(&report);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_trends(report: &TrendReport) {
    println!("Trend report ({})", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    println!("{}", report.summary);
    println!();
    println!("Revenue, last 30 days: {}", format_currency(report.revenue_last_30_days));
    println!("Revenue, last 7 days:  {}", format_currency(report.revenue_last_7_days));
    println!(
        "Next week forecast:    {} ({})",
        format_currency(report.forecast.predicted_revenue),
        report.forecast.trend
    );

    if !report.top_products.is_empty() {
        println!();
        println!("Top products:");
        for p in &report.top_products {
            println!(
                "  {:<40} {:>6} sold  {:>12}",
                p.product_name,
                p.quantity_sold,
                format_currency(p.revenue)
            );
        }
    }

    if !report.category_revenue.is_empty() {
        println!();
        println!("Revenue by category:");
        for c in &report.category_revenue {
            println!("  {:<40} {:>12}", c.category_name, format_currency(c.revenue));
        }
    }

    let recs = &report.recommendations;
    println!();
    println!("Recommendations:");
    println!("  Product:   {}", recs.product);
    println!("  Price:     {}", recs.price);
    println!("  Place:     {}", recs.place);
    println!("  Promotion: {}", recs.promotion);
}

/// List live products at or below the stock threshold.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn low_stock(config: &CatalogConfig, threshold: Option<i32>) -> Result<(), CommandError> {
    let catalog = catalog(config, connect(config).await?);
    let products = catalog.products.low_stock(threshold).await?;

    tracing::info!(count = products.len(), "Low stock products");
    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!(
                "  {:<20} {:<40} {:>5}",
                product.sku(),
                product.name(),
                product.stock_quantity()
            );
        }
    }
    Ok(())
}

/// Sale counts and revenue per status.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn sales(config: &CatalogConfig) -> Result<(), CommandError> {
    let catalog = catalog(config, connect(config).await?);
    let summary = catalog.sales.summary().await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Sales: {}  Revenue: {}",
            summary.total_sales,
            format_currency(summary.total_revenue)
        );
        for total in &summary.by_status {
            println!(
                "  {:<12} {:>6}  {:>12}",
                total.status.to_string(),
                total.count,
                format_currency(total.total_amount)
            );
        }
    }
    Ok(())
}
