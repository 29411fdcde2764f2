use std::sync::Arc;

use chrono::Utc;
use emporium_core::CategoryId;
use emporium_core::category::{Category, CategoryDetails, CategorySummary, NewCategory};
use tracing::instrument;

use crate::audit::{self, AuditAction, AuditEntity};
use crate::db::CatalogStore;
use crate::error::CatalogError;

/// Category CRUD. Names are unique among live categories, ignoring case.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CatalogStore>,
}

impl CategoryService {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Live categories with product counts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CategorySummary>, CatalogError> {
        Ok(self.store.list_categories().await?)
    }

    /// # Errors
    ///
    /// `NotFound` for unknown or deleted categories.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get(&self, id: CategoryId) -> Result<CategorySummary, CatalogError> {
        let category = self.live(id).await?;
        let product_count = self.store.count_products_in_category(id).await?;
        Ok(CategorySummary {
            category,
            product_count,
        })
    }

    /// # Errors
    ///
    /// `Validation` for a bad name or description, `Conflict` when a live
    /// category already has the name.
    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn create(&self, details: CategoryDetails) -> Result<Category, CatalogError> {
        let new = NewCategory::new(details, Utc::now())?;
        self.ensure_name_available(&new.details.name, None).await?;

        let category = self.store.insert_category(new).await?;
        audit::record(
            AuditEntity::Category,
            category.id.as_i32(),
            AuditAction::Created,
            Some(category.name.as_str()),
        );
        Ok(category)
    }

    /// # Errors
    ///
    /// Same as [`Self::create`], plus `NotFound` for unknown categories.
    #[instrument(skip(self, details), fields(category_id = %id))]
    pub async fn update(
        &self,
        id: CategoryId,
        details: CategoryDetails,
    ) -> Result<Category, CatalogError> {
        let current = self.live(id).await?;
        if !current.has_name(&details.name) {
            self.ensure_name_available(&details.name, Some(id)).await?;
        }

        let updated = current.apply_update(details, Utc::now())?;
        self.store.update_category(&updated).await?;
        audit::record(
            AuditEntity::Category,
            id.as_i32(),
            AuditAction::Updated,
            Some(updated.name.as_str()),
        );
        Ok(updated)
    }

    /// Soft-delete an empty category.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown categories, `Conflict` while live products
    /// still belong to it.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), CatalogError> {
        let current = self.live(id).await?;
        let products = self.store.count_products_in_category(id).await?;
        if products > 0 {
            return Err(CatalogError::Conflict(format!(
                "category {id} still has {products} product(s)"
            )));
        }

        self.store
            .update_category(&current.soft_deleted(Utc::now()))
            .await?;
        audit::record(AuditEntity::Category, id.as_i32(), AuditAction::Deleted, None);
        Ok(())
    }

    /// Bring back a soft-deleted category.
    ///
    /// # Errors
    ///
    /// `NotFound` unless the category exists and is deleted, `Conflict` when a
    /// live category has taken its name meanwhile.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn restore(&self, id: CategoryId) -> Result<Category, CatalogError> {
        let current = self
            .store
            .get_category(id, true)
            .await?
            .filter(|c| c.lifecycle.is_deleted())
            .ok_or_else(|| CatalogError::not_found("deleted category", id))?;
        self.ensure_name_available(&current.name, Some(id)).await?;

        let restored = current.restored(Utc::now());
        self.store.update_category(&restored).await?;
        audit::record(AuditEntity::Category, id.as_i32(), AuditAction::Restored, None);
        Ok(restored)
    }

    async fn live(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.store
            .get_category(id, false)
            .await?
            .ok_or_else(|| CatalogError::not_found("category", id))
    }

    async fn ensure_name_available(
        &self,
        name: &str,
        owner: Option<CategoryId>,
    ) -> Result<(), CatalogError> {
        match self.store.find_category_by_name(name).await? {
            Some(existing) if Some(existing.id) != owner => Err(CatalogError::Conflict(format!(
                "category {} already exists",
                name.trim()
            ))),
            _ => Ok(()),
        }
    }
}
