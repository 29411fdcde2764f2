//! Emporium core - catalog domain, product governance and sales analytics.
//!
//! Everything in this crate is pure: no database access, no clocks, no
//! randomness. Callers pass `now` in and persist what comes back.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, statuses, price bounds, lifecycle timestamps, paging
//! - [`product`] - Products and their governed mutations
//! - [`category`] - Product categories
//! - [`sale`] - Sales, line items and payments
//! - [`price_history`] - Recorded price changes
//! - [`governance`] - Quality scoring, compliance screening, status workflow, fulfillment fees
//! - [`analytics`] - 30-day trend report and forecast

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod category;
pub mod error;
pub mod governance;
pub mod price_history;
pub mod product;
pub mod sale;
pub mod types;

pub use error::DomainError;
pub use types::*;
