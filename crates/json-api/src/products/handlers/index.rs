//! Product Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToParameters, ToSchema},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use storefront::catalog::{CatalogParams, CatalogQuery};

use crate::{
    extensions::*,
    observability::record_catalog_query,
    products::{
        errors::into_status_error,
        models::{PaginationResponse, ProductResponse},
    },
    state::State,
};

/// Catalog listing query string.
///
/// Every value is taken as text and validated as a whole, so a malformed value is reported
/// with its own message rather than a generic deserialisation failure.
#[derive(Debug, Default, Deserialize, ToParameters)]
#[salvo(parameters(default_parameter_in = Query))]
pub(crate) struct CatalogQueryParams {
    /// One-based page number, default 1
    page: Option<String>,

    /// Page size between 1 and 100, default 20
    limit: Option<String>,

    /// Case-insensitive match on title or description
    search: Option<String>,

    /// Category slug or id
    category: Option<String>,

    /// Inclusive lower price bound in minor units
    min_price: Option<String>,

    /// Inclusive upper price bound in minor units
    max_price: Option<String>,

    /// Colour label
    color: Option<String>,

    /// `true`/`1` to draw a random sample instead of the newest items
    randomize: Option<String>,
}

impl From<CatalogQueryParams> for CatalogParams {
    fn from(params: CatalogQueryParams) -> Self {
        CatalogParams {
            page: params.page,
            limit: params.limit,
            search: params.search,
            category: params.category,
            min_price: params.min_price,
            max_price: params.max_price,
            color: params.color,
            randomize: params.randomize,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CatalogResponse {
    /// The catalog page
    pub items: Vec<ProductResponse>,

    pub pagination: PaginationResponse,
}

/// Product Index Handler
///
/// Returns one catalog page. With `randomize` the page is a random sample of the matching
/// items and repeated calls may differ.
#[endpoint(
    tags("products"),
    summary = "List Products",
    responses(
        (status_code = StatusCode::OK, description = "Catalog page"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid query parameter"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    params: CatalogQueryParams,
    depot: &mut Depot,
) -> Result<Json<CatalogResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let query = CatalogQuery::try_from(CatalogParams::from(params))
        .or_400("invalid catalog query")?;
    let mode = query.mode;

    let page = state
        .app
        .products
        .query_catalog(query)
        .await
        .map_err(into_status_error)?;

    record_catalog_query(mode.as_str());

    let page = page.map(ProductResponse::from);

    Ok(Json(CatalogResponse {
        items: page.items,
        pagination: page.pagination.into(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use storefront::{
        catalog::{CatalogMode, Page, PageRequest, Pagination},
        identifiers::Identifier,
    };
    use storefront_app::domain::products::{
        MockProductsService, ProductsServiceError, models::ProductUuid,
    };
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::test_helpers::{TestMocks, make_product};

    use super::*;

    fn make_service(repo: MockProductsService) -> Service {
        TestMocks::products(repo).public_service(Router::with_path("products").get(handler))
    }

    fn strict(repo: &mut MockProductsService) {
        repo.expect_resolve_product().never();
        repo.expect_create_product().never();
        repo.expect_update_product().never();
        repo.expect_delete_product().never();
    }

    #[tokio::test]
    async fn test_list_products_returns_items_and_pagination() -> TestResult {
        let uuid = ProductUuid::from_uuid(Uuid::now_v7());
        let product = make_product(uuid, "blue-tee");

        let mut repo = MockProductsService::new();

        repo.expect_query_catalog()
            .once()
            .withf(|query| {
                query.page == PageRequest::new(2, 1).unwrap_or_default()
                    && query.mode == CatalogMode::Deterministic
                    && query.filter.category == Some(Identifier::Slug("shirts".to_string()))
                    && query.filter.price.min() == Some(100)
                    && query.filter.color.as_deref() == Some("blue")
            })
            .return_once(move |query| {
                Ok(Page {
                    items: vec![product],
                    pagination: Pagination::new(query.page, 3),
                })
            });

        strict(&mut repo);

        let mut res = TestClient::get(
            "http://example.com/products?page=2&limit=1&category=shirts&min_price=100&color=Blue",
        )
        .send(&make_service(repo))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: CatalogResponse = res.take_json().await?;

        assert_eq!(body.items.len(), 1);
        assert_eq!(body.items[0].slug, "blue-tee");
        assert_eq!(body.items[0].id, uuid.to_string());
        assert_eq!(body.pagination.total, 3);
        assert_eq!(body.pagination.total_pages, 3);
        assert!(body.pagination.has_next);
        assert!(body.pagination.has_prev);
        assert_eq!(body.pagination.has_more, body.pagination.has_next);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_randomized_mode_is_forwarded() -> TestResult {
        let mut repo = MockProductsService::new();

        repo.expect_query_catalog()
            .once()
            .withf(|query| query.mode == CatalogMode::Randomized)
            .return_once(|query| Ok(Page::empty(query.page)));

        strict(&mut repo);

        let res = TestClient::get("http://example.com/products?randomize=true")
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_invalid_parameters_return_400() -> TestResult {
        for query in [
            "min_price=abc",
            "max_price=-5",
            "min_price=500&max_price=100",
            "limit=0",
            "limit=101",
            "page=0",
            "randomize=maybe",
            "category=Not%20A%20Slug!",
        ] {
            let mut repo = MockProductsService::new();

            repo.expect_query_catalog().never();
            strict(&mut repo);

            let res = TestClient::get(format!("http://example.com/products?{query}"))
                .send(&make_service(repo))
                .await;

            assert_eq!(
                res.status_code,
                Some(StatusCode::BAD_REQUEST),
                "expected 400 for {query}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_storage_error_returns_500() -> TestResult {
        let mut repo = MockProductsService::new();

        repo.expect_query_catalog()
            .once()
            .return_once(|_| Err(ProductsServiceError::Sql(sqlx::Error::PoolTimedOut)));

        strict(&mut repo);

        let res = TestClient::get("http://example.com/products")
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
