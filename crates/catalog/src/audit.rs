//! Audit trail for catalog mutations.
//!
//! Every successful create, update, delete, restore or sale transition emits
//! one `tracing` event on the `audit` target. Route that target to durable
//! storage with the subscriber's filter.

/// What kind of record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEntity {
    Product,
    Category,
    Sale,
}

impl AuditEntity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Category => "category",
            Self::Sale => "sale",
        }
    }
}

/// What happened to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Created,
    Updated,
    StockChanged,
    Deleted,
    Restored,
    Completed,
    Cancelled,
    Refunded,
    PaymentRecorded,
    PaymentProcessed,
    PaymentFailed,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::StockChanged => "stock_changed",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::PaymentRecorded => "payment_recorded",
            Self::PaymentProcessed => "payment_processed",
            Self::PaymentFailed => "payment_failed",
        }
    }
}

/// Emit an audit event.
pub fn record(entity: AuditEntity, id: i32, action: AuditAction, detail: Option<&str>) {
    tracing::info!(
        target: "audit",
        entity = entity.as_str(),
        entity_id = id,
        action = action.as_str(),
        detail = detail.unwrap_or_default(),
        "{} {} {}",
        entity.as_str(),
        id,
        action.as_str()
    );
}
