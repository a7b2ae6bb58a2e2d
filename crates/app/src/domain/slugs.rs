//! Store-backed slug registry.

use sqlx::{Postgres, Transaction, query_scalar};
use storefront::slugs::{SlugError, SlugRegistry, resolve_unique};
use uuid::Uuid;

const PRODUCT_SLUG_EXISTS_SQL: &str = include_str!("sql/product_slug_exists.sql");
const CATEGORY_SLUG_EXISTS_SQL: &str = include_str!("sql/category_slug_exists.sql");

/// Number of write attempts made for a slugged record before a conflict is surfaced.
pub(crate) const SLUG_WRITE_ATTEMPTS: u32 = 2;

/// Collection whose slugs are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlugTable {
    Products,
    Categories,
}

impl SlugTable {
    const fn exists_sql(self) -> &'static str {
        match self {
            Self::Products => PRODUCT_SLUG_EXISTS_SQL,
            Self::Categories => CATEGORY_SLUG_EXISTS_SQL,
        }
    }

    /// Name of the unique constraint guarding the collection's slugs.
    pub(crate) const fn constraint(self) -> &'static str {
        match self {
            Self::Products => "products_slug_key",
            Self::Categories => "categories_slug_key",
        }
    }
}

/// Existence check over one collection inside an open transaction.
#[derive(Debug)]
pub(crate) struct PgSlugRegistry<'t, 'c> {
    tx: &'t mut Transaction<'c, Postgres>,
    table: SlugTable,
    exclude: Option<Uuid>,
}

impl<'t, 'c> PgSlugRegistry<'t, 'c> {
    pub(crate) fn new(
        tx: &'t mut Transaction<'c, Postgres>,
        table: SlugTable,
        exclude: Option<Uuid>,
    ) -> Self {
        Self { tx, table, exclude }
    }
}

impl SlugRegistry for PgSlugRegistry<'_, '_> {
    type Error = sqlx::Error;

    async fn slug_exists(&mut self, slug: &str) -> Result<bool, Self::Error> {
        query_scalar::<Postgres, bool>(self.table.exists_sql())
            .bind(slug)
            .bind(self.exclude)
            .fetch_one(&mut **self.tx)
            .await
    }
}

/// Resolve `candidate` into a free slug for `table`, ignoring the record `exclude`.
pub(crate) async fn resolve_slug(
    tx: &mut Transaction<'_, Postgres>,
    table: SlugTable,
    candidate: &str,
    exclude: Option<Uuid>,
) -> Result<String, SlugError<sqlx::Error>> {
    resolve_unique(candidate, &mut PgSlugRegistry::new(tx, table, exclude)).await
}
