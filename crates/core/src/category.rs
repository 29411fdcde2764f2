//! Product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::types::{CategoryId, Lifecycle};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Editable category fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetails {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryDetails {
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for an out-of-range name or an
    /// overlong description.
    pub fn validate(&self) -> Result<(), DomainError> {
        let len = self.name.trim().chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
            return Err(DomainError::Validation(format!(
                "category name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
            )));
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_CHARS)
        {
            return Err(DomainError::Validation(format!(
                "description cannot exceed {DESCRIPTION_MAX_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub lifecycle: Lifecycle,
}

impl Category {
    /// Replace the editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for invalid details.
    pub fn apply_update(&self, details: CategoryDetails, now: DateTime<Utc>) -> Result<Self, DomainError> {
        details.validate()?;
        Ok(Self {
            id: self.id,
            name: details.name,
            description: details.description,
            lifecycle: self.lifecycle.touched(now),
        })
    }

    #[must_use]
    pub fn soft_deleted(&self, now: DateTime<Utc>) -> Self {
        Self {
            lifecycle: self.lifecycle.soft_deleted(now),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn restored(&self, now: DateTime<Utc>) -> Self {
        Self {
            lifecycle: self.lifecycle.restored(now),
            ..self.clone()
        }
    }

    /// Names are unique ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// A validated category that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub details: CategoryDetails,
    pub lifecycle: Lifecycle,
}

impl NewCategory {
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for invalid details.
    pub fn new(details: CategoryDetails, now: DateTime<Utc>) -> Result<Self, DomainError> {
        details.validate()?;
        Ok(Self {
            details,
            lifecycle: Lifecycle::new(now),
        })
    }

    #[must_use]
    pub fn with_id(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.details.name,
            description: self.details.description,
            lifecycle: self.lifecycle,
        }
    }
}

/// A category with the number of live products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub product_count: u64,
}
