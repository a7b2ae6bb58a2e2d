//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, QueryBuilder, Row, Transaction, postgres::PgRow, query, query_as,
};
use storefront::{
    catalog::{CatalogMode, PageRequest, RANDOM_SAMPLE_CAP},
    identifiers::{Identifier, format_internal_id},
};

use crate::{
    database::unsigned,
    domain::{
        categories::models::CategoryUuid,
        products::models::{Product, ProductUuid},
    },
};

const FIND_PRODUCT_SQL: &str = include_str!("sql/find_product.sql");
const FIND_PRODUCT_BY_SLUG_SQL: &str = include_str!("sql/find_product_by_slug.sql");
const LOCK_PRODUCT_SQL: &str = include_str!("sql/lock_product.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");

const PRODUCT_COLUMNS: &str = "uuid, slug, title, description, price, category_uuid, colors, \
     sizes, stock, images, rating, review_count, created_at, updated_at";

/// Product attributes converted to their store representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProductValues {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: i64,
    pub(crate) category_uuid: Option<CategoryUuid>,
    pub(crate) colors: Vec<String>,
    pub(crate) sizes: Vec<String>,
    pub(crate) stock: i32,
    pub(crate) images: Vec<String>,
}

/// Catalog filters converted to their store representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CatalogSqlFilter {
    pub(crate) search: Option<String>,
    pub(crate) category: Option<CategoryUuid>,
    pub(crate) min_price: Option<i64>,
    pub(crate) max_price: Option<i64>,
    pub(crate) color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Option<Product>, sqlx::Error> {
        query_as::<Postgres, Product>(FIND_PRODUCT_SQL)
            .bind(product)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_product_by_slug(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        slug: &str,
    ) -> Result<Option<Product>, sqlx::Error> {
        query_as::<Postgres, Product>(FIND_PRODUCT_BY_SLUG_SQL)
            .bind(slug)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Resolve a public identifier, trying the internal id before the slug.
    pub(crate) async fn resolve_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identifier: &Identifier,
    ) -> Result<Option<Product>, sqlx::Error> {
        match identifier {
            Identifier::Id(id) => {
                if let Some(product) = self.find_product(tx, ProductUuid::from_uuid(*id)).await? {
                    return Ok(Some(product));
                }

                self.find_product_by_slug(tx, &format_internal_id(*id))
                    .await
            }
            Identifier::Slug(slug) => self.find_product_by_slug(tx, slug).await,
        }
    }

    pub(crate) async fn lock_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Product, sqlx::Error> {
        query_as::<Postgres, Product>(LOCK_PRODUCT_SQL)
            .bind(product)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        slug: &str,
        values: &ProductValues,
    ) -> Result<Product, sqlx::Error> {
        query_as::<Postgres, Product>(CREATE_PRODUCT_SQL)
            .bind(slug)
            .bind(&values.title)
            .bind(&values.description)
            .bind(values.price)
            .bind(values.category_uuid)
            .bind(&values.colors)
            .bind(&values.sizes)
            .bind(values.stock)
            .bind(&values.images)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        slug: &str,
        values: &ProductValues,
    ) -> Result<Product, sqlx::Error> {
        query_as::<Postgres, Product>(UPDATE_PRODUCT_SQL)
            .bind(product)
            .bind(slug)
            .bind(&values.title)
            .bind(&values.description)
            .bind(values.price)
            .bind(values.category_uuid)
            .bind(&values.colors)
            .bind(&values.sizes)
            .bind(values.stock)
            .bind(&values.images)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Count the products matching `filter`, independent of any page.
    pub(crate) async fn count_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        filter: &CatalogSqlFilter,
    ) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");

        push_filters(&mut builder, filter);

        builder.build_query_scalar().fetch_one(&mut **tx).await
    }

    /// Fetch one page of products matching `filter`.
    ///
    /// Deterministic pages are ordered newest first. Randomized pages are sliced out of a
    /// sample of at most [`RANDOM_SAMPLE_CAP`] rows drawn afresh for every call.
    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        filter: &CatalogSqlFilter,
        page: PageRequest,
        mode: CatalogMode,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let limit = i64::from(page.page_size());
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let mut builder = match mode {
            CatalogMode::Deterministic => {
                let mut builder = QueryBuilder::<Postgres>::new(format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products"
                ));

                push_filters(&mut builder, filter);
                builder.push(" ORDER BY created_at DESC, uuid DESC");

                builder
            }
            CatalogMode::Randomized => {
                let mut builder = QueryBuilder::<Postgres>::new(format!(
                    "WITH sample AS (SELECT {PRODUCT_COLUMNS} FROM products"
                ));

                push_filters(&mut builder, filter);
                builder
                    .push(" ORDER BY random() LIMIT ")
                    .push_bind(i64::try_from(RANDOM_SAMPLE_CAP).unwrap_or(i64::MAX))
                    .push(format!(") SELECT {PRODUCT_COLUMNS} FROM sample"));

                builder
            }
        };

        builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder
            .build_query_as::<Product>()
            .fetch_all(&mut **tx)
            .await
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &CatalogSqlFilter) {
    builder.push(" WHERE TRUE");

    if let Some(pattern) = &filter.search {
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\')");
    }

    if let Some(category) = filter.category {
        builder.push(" AND category_uuid = ").push_bind(category);
    }

    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }

    if let Some(color) = &filter.color {
        builder
            .push(" AND ")
            .push_bind(color.clone())
            .push(" = ANY(colors)");
    }
}

/// Build a case-insensitive substring pattern, escaping `LIKE` metacharacters.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);

    pattern.push('%');

    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }

        pattern.push(ch);
    }

    pattern.push('%');

    pattern
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            slug: row.try_get("slug")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            price: unsigned(row.try_get::<i64, _>("price")?, "price")?,
            category_uuid: row.try_get("category_uuid")?,
            colors: row.try_get("colors")?,
            sizes: row.try_get("sizes")?,
            stock: unsigned(row.try_get::<i32, _>("stock")?, "stock")?,
            images: row.try_get("images")?,
            rating: row.try_get("rating")?,
            review_count: unsigned(row.try_get::<i32, _>("review_count")?, "review_count")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
