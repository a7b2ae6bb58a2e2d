//! Products service.

use async_trait::async_trait;
use mockall::automock;
use storefront::{
    catalog::{CatalogFilter, CatalogMode, CatalogQuery, Page, Pagination},
    identifiers::Identifier,
    slugs::slug_or_fallback,
};
use tracing::{debug, warn};

use crate::{
    database::{Db, is_unique_violation},
    domain::{
        categories::repository::PgCategoriesRepository,
        products::{
            errors::ProductsServiceError,
            models::{NewProduct, Product, ProductUpdate, ProductUuid},
            repository::{CatalogSqlFilter, PgProductsRepository, ProductValues, like_pattern},
        },
        slugs::{SLUG_WRITE_ATTEMPTS, SlugTable, resolve_slug},
    },
};

/// Prefix for slugs of products whose titles have no alphanumerics.
const SLUG_FALLBACK_PREFIX: &str = "product";

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
    categories: PgCategoriesRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
            categories: PgCategoriesRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn resolve_product(
        &self,
        identifier: Identifier,
    ) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.resolve_product(&mut tx, &identifier).await?;

        tx.commit().await?;

        product.ok_or_else(|| {
            debug!(%identifier, "product not found");

            ProductsServiceError::NotFound
        })
    }

    async fn query_catalog(
        &self,
        query: CatalogQuery,
    ) -> Result<Page<Product>, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(filter) = self.store_filter(&mut tx, &query.filter).await? else {
            tx.commit().await?;

            debug!(category = ?query.filter.category, "catalog category not found");

            return Ok(Page::empty(query.page));
        };

        let matching = u64::try_from(self.repository.count_products(&mut tx, &filter).await?)?;

        let total = match query.mode {
            CatalogMode::Deterministic => matching,
            CatalogMode::Randomized => CatalogQuery::sample_size(matching),
        };

        let items = self
            .repository
            .list_products(&mut tx, &filter, query.page, query.mode)
            .await?;

        tx.commit().await?;

        debug!(
            mode = query.mode.as_str(),
            page = query.page.page(),
            total,
            returned = items.len(),
            "catalog page queried"
        );

        Ok(Page {
            items,
            pagination: Pagination::new(query.page, total),
        })
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        let values = store_values(product)?;
        let candidate = slug_or_fallback(&values.title, SLUG_FALLBACK_PREFIX);

        for attempt in 1..=SLUG_WRITE_ATTEMPTS {
            let mut tx = self.db.begin().await?;

            let slug = resolve_slug(&mut tx, SlugTable::Products, &candidate, None).await?;

            match self.repository.create_product(&mut tx, &slug, &values).await {
                Ok(created) => {
                    tx.commit().await?;

                    return Ok(created);
                }
                Err(error) if is_unique_violation(&error, SlugTable::Products.constraint()) => {
                    warn!(%slug, attempt, "product slug taken concurrently");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(ProductsServiceError::SlugConflict)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError> {
        let values = store_values(update)?;

        for attempt in 1..=SLUG_WRITE_ATTEMPTS {
            let mut tx = self.db.begin().await?;

            let current = self.repository.lock_product(&mut tx, product).await?;

            let slug = if current.title == values.title {
                current.slug
            } else {
                resolve_slug(
                    &mut tx,
                    SlugTable::Products,
                    &slug_or_fallback(&values.title, SLUG_FALLBACK_PREFIX),
                    Some(product.into_uuid()),
                )
                .await?
            };

            match self
                .repository
                .update_product(&mut tx, product, &slug, &values)
                .await
            {
                Ok(updated) => {
                    tx.commit().await?;

                    return Ok(updated);
                }
                Err(error) if is_unique_violation(&error, SlugTable::Products.constraint()) => {
                    warn!(%slug, attempt, "product slug taken concurrently");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(ProductsServiceError::SlugConflict)
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_product(&mut tx, product).await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

impl PgProductsService {
    /// Convert catalog filters for the store, resolving the category first.
    ///
    /// Returns `None` when the requested category does not exist, in which case nothing can
    /// match.
    async fn store_filter(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        filter: &CatalogFilter,
    ) -> Result<Option<CatalogSqlFilter>, ProductsServiceError> {
        let category = match &filter.category {
            Some(identifier) => match self.categories.resolve_category(tx, identifier).await? {
                Some(category) => Some(category.uuid),
                None => return Ok(None),
            },
            None => None,
        };

        Ok(Some(CatalogSqlFilter {
            search: filter.search.as_deref().map(like_pattern),
            category,
            min_price: filter.price.min().map(saturating_i64),
            max_price: filter.price.max().map(saturating_i64),
            color: filter.color.clone(),
        }))
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn store_values(product: NewProduct) -> Result<ProductValues, ProductsServiceError> {
    let title = product.title.trim().to_string();

    if title.is_empty() {
        return Err(ProductsServiceError::EmptyTitle);
    }

    Ok(ProductValues {
        title,
        description: product.description,
        price: i64::try_from(product.price)?,
        category_uuid: product.category_uuid,
        colors: normalize_labels(product.colors, true),
        sizes: normalize_labels(product.sizes, false),
        stock: i32::try_from(product.stock)?,
        images: product.images,
    })
}

/// Trim, drop empties and duplicates, keeping first-seen order.
fn normalize_labels(labels: Vec<String>, lowercase: bool) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(labels.len());

    for label in labels {
        let label = label.trim();
        let label = if lowercase {
            label.to_lowercase()
        } else {
            label.to_string()
        };

        if !label.is_empty() && !normalized.contains(&label) {
            normalized.push(label);
        }
    }

    normalized
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Resolves a product by internal id or slug.
    async fn resolve_product(
        &self,
        identifier: Identifier,
    ) -> Result<Product, ProductsServiceError>;

    /// Retrieves one catalog page with its pagination metadata.
    async fn query_catalog(
        &self,
        query: CatalogQuery,
    ) -> Result<Page<Product>, ProductsServiceError>;

    /// Creates a product with a unique slug derived from its title.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError>;

    /// Updates a product, regenerating its slug only when the title changes.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError>;

    /// Deletes a product with the given UUID.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError>;
}
