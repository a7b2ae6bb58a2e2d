//! Categories Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use storefront::identifiers::{Identifier, format_internal_id};

use crate::domain::categories::models::{Category, CategoryUuid};

const LIST_CATEGORIES_SQL: &str = include_str!("sql/list_categories.sql");
const FIND_CATEGORY_SQL: &str = include_str!("sql/find_category.sql");
const FIND_CATEGORY_BY_SLUG_SQL: &str = include_str!("sql/find_category_by_slug.sql");
const LOCK_CATEGORY_SQL: &str = include_str!("sql/lock_category.sql");
const CREATE_CATEGORY_SQL: &str = include_str!("sql/create_category.sql");
const UPDATE_CATEGORY_SQL: &str = include_str!("sql/update_category.sql");
const DELETE_CATEGORY_SQL: &str = include_str!("sql/delete_category.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCategoriesRepository;

impl PgCategoriesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_categories(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Category>, sqlx::Error> {
        query_as::<Postgres, Category>(LIST_CATEGORIES_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn find_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
    ) -> Result<Option<Category>, sqlx::Error> {
        query_as::<Postgres, Category>(FIND_CATEGORY_SQL)
            .bind(category)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_category_by_slug(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        slug: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        query_as::<Postgres, Category>(FIND_CATEGORY_BY_SLUG_SQL)
            .bind(slug)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Resolve a public identifier, trying the internal id before the slug.
    ///
    /// An id that matches no record is retried as a slug, since a 32 hex digit slug is
    /// syntactically indistinguishable from an id.
    pub(crate) async fn resolve_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identifier: &Identifier,
    ) -> Result<Option<Category>, sqlx::Error> {
        match identifier {
            Identifier::Id(id) => {
                if let Some(category) = self
                    .find_category(tx, CategoryUuid::from_uuid(*id))
                    .await?
                {
                    return Ok(Some(category));
                }

                self.find_category_by_slug(tx, &format_internal_id(*id))
                    .await
            }
            Identifier::Slug(slug) => self.find_category_by_slug(tx, slug).await,
        }
    }

    pub(crate) async fn lock_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
    ) -> Result<Category, sqlx::Error> {
        query_as::<Postgres, Category>(LOCK_CATEGORY_SQL)
            .bind(category)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        slug: &str,
        name: &str,
        description: &str,
    ) -> Result<Category, sqlx::Error> {
        query_as::<Postgres, Category>(CREATE_CATEGORY_SQL)
            .bind(slug)
            .bind(name)
            .bind(description)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
        slug: &str,
        name: &str,
        description: &str,
    ) -> Result<Category, sqlx::Error> {
        query_as::<Postgres, Category>(UPDATE_CATEGORY_SQL)
            .bind(category)
            .bind(slug)
            .bind(name)
            .bind(description)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CATEGORY_SQL)
            .bind(category)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Category {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            slug: row.try_get("slug")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
