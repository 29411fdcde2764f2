//! Emporium CLI - migrations, demo data and reports.
//!
//! # Usage
//!
//! ```bash
//! # Apply catalog migrations
//! emporium migrate
//!
//! # Load demo categories, products and sales
//! emporium seed
//!
//! # 30-day trend report (text or JSON)
//! emporium report trends
//! emporium report trends --json
//!
//! # Products at or below the low-stock threshold
//! emporium report low-stock --threshold 5
//!
//! # Estimate a fulfillment fee
//! emporium fee --weight 2.5 --length 12 --width 8 --height 4
//! ```
//!
//! # Environment Variables
//!
//! - `EMPORIUM_DATABASE_URL` - `PostgreSQL` connection string (all commands but `fee`)
//! - `EMPORIUM_LOG_JSON` - emit JSON logs
//! - `SENTRY_DSN` - optional error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use emporium_catalog::{CatalogConfig, telemetry};

mod commands;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium catalog tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed,
    /// Print reports
    Report {
        #[command(subcommand)]
        report: ReportKind,
    },
    /// Estimate the fulfillment fee for a package
    Fee {
        /// Weight in pounds
        #[arg(long)]
        weight: f64,

        /// Length in inches
        #[arg(long)]
        length: f64,

        /// Width in inches
        #[arg(long)]
        width: f64,

        /// Height in inches
        #[arg(long)]
        height: f64,
    },
}

#[derive(Subcommand)]
enum ReportKind {
    /// Revenue trends, forecast and recommendations for the last 30 days
    Trends {
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Live products at or below a stock threshold
    LowStock {
        /// Override `EMPORIUM_LOW_STOCK_THRESHOLD`
        #[arg(short, long)]
        threshold: Option<i32>,
    },
    /// Sale counts and revenue by status
    Sales,
}

#[tokio::main]
async fn main() {
    let config = match CatalogConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(1);
        }
    };

    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(&config);

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CatalogConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(config).await?,
        Commands::Seed => commands::seed::run(config).await?,
        Commands::Report { report } => match report {
            ReportKind::Trends { json } => commands::report::trends(config, json).await?,
            ReportKind::LowStock { threshold } => {
                commands::report::low_stock(config, threshold).await?;
            }
            ReportKind::Sales => commands::report::sales(config).await?,
        },
        Commands::Fee {
            weight,
            length,
            width,
            height,
        } => commands::fee::run(weight, length, width, height)?,
    }
    Ok(())
}
