//! Categories service.

use async_trait::async_trait;
use mockall::automock;
use storefront::{identifiers::Identifier, slugs::slug_or_fallback};
use tracing::{debug, warn};

use crate::{
    database::{Db, is_unique_violation},
    domain::{
        categories::{
            errors::CategoriesServiceError,
            models::{Category, CategoryUpdate, CategoryUuid, NewCategory},
            repository::PgCategoriesRepository,
        },
        slugs::{SLUG_WRITE_ATTEMPTS, SlugTable, resolve_slug},
    },
};

/// Prefix for slugs of categories whose names have no alphanumerics.
const SLUG_FALLBACK_PREFIX: &str = "category";

#[derive(Debug, Clone)]
pub struct PgCategoriesService {
    db: Db,
    repository: PgCategoriesRepository,
}

impl PgCategoriesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCategoriesRepository::new(),
        }
    }
}

#[async_trait]
impl CategoriesService for PgCategoriesService {
    async fn list_categories(&self) -> Result<Vec<Category>, CategoriesServiceError> {
        let mut tx = self.db.begin().await?;

        let categories = self.repository.list_categories(&mut tx).await?;

        tx.commit().await?;

        Ok(categories)
    }

    async fn resolve_category(
        &self,
        identifier: Identifier,
    ) -> Result<Category, CategoriesServiceError> {
        let mut tx = self.db.begin().await?;

        let category = self.repository.resolve_category(&mut tx, &identifier).await?;

        tx.commit().await?;

        category.ok_or_else(|| {
            debug!(%identifier, "category not found");

            CategoriesServiceError::NotFound
        })
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, CategoriesServiceError> {
        let name = category.name.trim();

        if name.is_empty() {
            return Err(CategoriesServiceError::EmptyName);
        }

        let candidate = slug_or_fallback(name, SLUG_FALLBACK_PREFIX);

        for attempt in 1..=SLUG_WRITE_ATTEMPTS {
            let mut tx = self.db.begin().await?;

            let slug = resolve_slug(&mut tx, SlugTable::Categories, &candidate, None).await?;

            match self
                .repository
                .create_category(&mut tx, &slug, name, &category.description)
                .await
            {
                Ok(created) => {
                    tx.commit().await?;

                    return Ok(created);
                }
                Err(error) if is_unique_violation(&error, SlugTable::Categories.constraint()) => {
                    warn!(%slug, attempt, "category slug taken concurrently");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(CategoriesServiceError::SlugConflict)
    }

    async fn update_category(
        &self,
        category: CategoryUuid,
        update: CategoryUpdate,
    ) -> Result<Category, CategoriesServiceError> {
        let name = update.name.trim();

        if name.is_empty() {
            return Err(CategoriesServiceError::EmptyName);
        }

        for attempt in 1..=SLUG_WRITE_ATTEMPTS {
            let mut tx = self.db.begin().await?;

            let current = self.repository.lock_category(&mut tx, category).await?;

            let slug = if current.name == name {
                current.slug
            } else {
                resolve_slug(
                    &mut tx,
                    SlugTable::Categories,
                    &slug_or_fallback(name, SLUG_FALLBACK_PREFIX),
                    Some(category.into_uuid()),
                )
                .await?
            };

            match self
                .repository
                .update_category(&mut tx, category, &slug, name, &update.description)
                .await
            {
                Ok(updated) => {
                    tx.commit().await?;

                    return Ok(updated);
                }
                Err(error) if is_unique_violation(&error, SlugTable::Categories.constraint()) => {
                    warn!(%slug, attempt, "category slug taken concurrently");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(CategoriesServiceError::SlugConflict)
    }

    async fn delete_category(&self, category: CategoryUuid) -> Result<(), CategoriesServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_category(&mut tx, category).await?;

        if rows_affected == 0 {
            return Err(CategoriesServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CategoriesService: Send + Sync {
    /// Retrieves all categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, CategoriesServiceError>;

    /// Resolves a category by internal id or slug.
    async fn resolve_category(
        &self,
        identifier: Identifier,
    ) -> Result<Category, CategoriesServiceError>;

    /// Creates a category with a unique slug derived from its name.
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<Category, CategoriesServiceError>;

    /// Updates a category, regenerating its slug only when the name changes.
    async fn update_category(
        &self,
        category: CategoryUuid,
        update: CategoryUpdate,
    ) -> Result<Category, CategoriesServiceError>;

    /// Deletes a category; products in it become uncategorised.
    async fn delete_category(&self, category: CategoryUuid) -> Result<(), CategoriesServiceError>;
}
