//! Catalog configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (`PostgreSQL` store only)
//! - `EMPORIUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `EMPORIUM_PRODUCT_CACHE_TTL_SECS` - Product list cache TTL (default: 120)
//! - `EMPORIUM_PRODUCT_CACHE_CAPACITY` - Max cached product list pages (default: 1000)
//! - `EMPORIUM_LOW_STOCK_THRESHOLD` - Default low stock threshold (default: 10)
//! - `EMPORIUM_ENFORCE_PRICE_BOUNDS` - Reject prices outside floor/ceiling (default: false)
//! - `EMPORIUM_LOG_JSON` - Emit JSON logs when set to `true` or `1`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_CACHE_TTL_SECS: u64 = 120;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct CatalogConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// How long a cached product list page stays valid
    pub product_cache_ttl: Duration,
    /// Maximum number of cached product list pages
    pub product_cache_capacity: u64,
    /// Stock level at or below which a product counts as low stock
    pub low_stock_threshold: i32,
    /// Reject saves whose price falls outside the product's bounds
    pub enforce_price_bounds: bool,
    /// Emit JSON formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("product_cache_ttl", &self.product_cache_ttl)
            .field("product_cache_capacity", &self.product_cache_capacity)
            .field("low_stock_threshold", &self.low_stock_threshold)
            .field("enforce_price_bounds", &self.enforce_price_bounds)
            .field("log_json", &self.log_json)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            product_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            product_cache_capacity: DEFAULT_CACHE_CAPACITY,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            enforce_price_bounds: false,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let product_cache_ttl = get_env_or_default(
            "EMPORIUM_PRODUCT_CACHE_TTL_SECS",
            &DEFAULT_CACHE_TTL_SECS.to_string(),
        )
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("EMPORIUM_PRODUCT_CACHE_TTL_SECS".to_string(), e.to_string())
        })?;
        let product_cache_capacity = get_env_or_default(
            "EMPORIUM_PRODUCT_CACHE_CAPACITY",
            &DEFAULT_CACHE_CAPACITY.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("EMPORIUM_PRODUCT_CACHE_CAPACITY".to_string(), e.to_string())
        })?;
        let low_stock_threshold = get_env_or_default(
            "EMPORIUM_LOW_STOCK_THRESHOLD",
            &DEFAULT_LOW_STOCK_THRESHOLD.to_string(),
        )
        .parse::<i32>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("EMPORIUM_LOW_STOCK_THRESHOLD".to_string(), e.to_string())
        })?;

        Ok(Self {
            database_url: get_database_url("EMPORIUM_DATABASE_URL"),
            product_cache_ttl,
            product_cache_capacity,
            low_stock_threshold,
            enforce_price_bounds: get_bool_env("EMPORIUM_ENFORCE_PRICE_BOUNDS")?,
            log_json: get_bool_env("EMPORIUM_LOG_JSON")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// The database URL, required by anything that talks to `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no URL was configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("EMPORIUM_DATABASE_URL".to_string()))
    }
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a boolean flag; unset means `false`.
fn get_bool_env(key: &str) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(false), |value| parse_bool(key, &value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}
