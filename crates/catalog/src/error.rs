//! Unified error handling for catalog services.

use emporium_core::DomainError;
use thiserror::Error;

use crate::db::RepositoryError;

/// Service-level error type.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Requested record does not exist (or is soft-deleted).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Storage failed.
    #[error("Database error: {0}")]
    Database(#[source] RepositoryError),

    /// Anything else that should not happen.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub(crate) fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }

    /// Stable machine-readable name of the error category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the failure is on our side rather than the caller's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }

    /// Log the error and send server errors to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                kind = self.kind(),
                sentry_event_id = %event_id,
                "Catalog operation failed"
            );
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Catalog request rejected");
        }
    }
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record".to_string()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else if err.is_conflict() {
            Self::Conflict(err.to_string())
        } else if let DomainError::Validation(message) = err {
            Self::Validation(message)
        } else {
            Self::Validation(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}
