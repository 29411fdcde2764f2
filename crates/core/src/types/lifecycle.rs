//! Creation, modification and soft-delete timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamps shared by every persisted record.
///
/// All transitions are pure: they consume the value and return the next
/// state, so callers decide when the new state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the record was soft deleted. `None` for live records.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
    /// A fresh, never-modified record.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: None,
            deleted_at: None,
        }
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Record a modification.
    #[must_use]
    pub const fn touched(self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(now),
            ..self
        }
    }

    /// Mark the record deleted without removing it.
    #[must_use]
    pub const fn soft_deleted(self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(now),
            deleted_at: Some(now),
            ..self
        }
    }

    /// Undo a soft delete.
    #[must_use]
    pub const fn restored(self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(now),
            deleted_at: None,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_soft_delete_and_restore() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(1);
        let t2 = t0 + Duration::minutes(2);

        let live = Lifecycle::new(t0);
        assert!(!live.is_deleted());
        assert_eq!(live.updated_at, None);

        let deleted = live.soft_deleted(t1);
        assert!(deleted.is_deleted());
        assert_eq!(deleted.deleted_at, Some(t1));
        assert_eq!(deleted.created_at, t0);

        let restored = deleted.restored(t2);
        assert!(!restored.is_deleted());
        assert_eq!(restored.updated_at, Some(t2));
    }

    #[test]
    fn test_transitions_do_not_mutate_original() {
        let t0 = Utc::now();
        let live = Lifecycle::new(t0);
        let _ = live.touched(t0 + Duration::seconds(5));
        assert_eq!(live.updated_at, None);
    }
}
