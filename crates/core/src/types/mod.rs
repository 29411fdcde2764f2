//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod lifecycle;
pub mod page;
pub mod price;
pub mod status;

pub use id::*;
pub use lifecycle::Lifecycle;
pub use page::{Page, PageRequest, SortDirection};
pub use price::{BoundsCheck, MONEY_MAX, PriceBounds};
pub use status::*;
