//! Get Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    extensions::*,
    observability::record_order_lookup,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Get Order Handler
///
/// Resolves one of the caller's orders by its public token. An internal id, or a token
/// belonging to someone else, is not found.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order found"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.get",
    skip(token, depot),
    fields(user_uuid = tracing::field::Empty, token_path = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    token: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.principal_or_401()?.user_uuid;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));

    let lookup = state
        .app
        .orders
        .resolve_order(user, &token)
        .await
        .map_err(into_status_error)?;

    span.record("token_path", lookup.path.as_str());
    record_order_lookup(lookup.path.as_str());

    Ok(Json(lookup.order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use storefront_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        models::{OrderLookup, OrderStatus, TokenPath},
    };
    use testresult::TestResult;

    use crate::test_helpers::{TEST_ORDER_TOKEN, TEST_USER_UUID, TestMocks, make_order};

    use super::*;

    fn make_service(repo: MockOrdersService) -> Service {
        TestMocks::orders(repo).customer_service(Router::with_path("orders/{token}").get(handler))
    }

    fn strict(repo: &mut MockOrdersService) {
        repo.expect_create_order().never();
        repo.expect_list_orders().never();
        repo.expect_update_order_status().never();
        repo.expect_backfill_tokens().never();
    }

    #[tokio::test]
    async fn test_get_order_by_token() -> TestResult {
        for path in [TokenPath::Stored, TokenPath::Recomputed] {
            let order = make_order(OrderStatus::Pending);
            let internal_id = order.uuid.to_string();

            let mut repo = MockOrdersService::new();

            repo.expect_resolve_order()
                .once()
                .withf(|user, token| *user == TEST_USER_UUID && token == TEST_ORDER_TOKEN)
                .return_once(move |_, _| Ok(OrderLookup { order, path }));

            strict(&mut repo);

            let mut res = TestClient::get(format!("http://example.com/orders/{TEST_ORDER_TOKEN}"))
                .send(&make_service(repo))
                .await;

            assert_eq!(res.status_code, Some(StatusCode::OK));

            let body = res.take_string().await?;
            let order: OrderResponse = serde_json::from_str(&body)?;

            assert_eq!(order.token, TEST_ORDER_TOKEN);
            assert_eq!(order.total, 3_000);
            assert!(!body.contains(&internal_id), "internal id leaked: {body}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_get_order_by_internal_id_returns_404() -> TestResult {
        let internal_id = make_order(OrderStatus::Pending).uuid.to_string();
        let expected = internal_id.clone();

        let mut repo = MockOrdersService::new();

        repo.expect_resolve_order()
            .once()
            .withf(move |_, token| token == expected)
            .return_once(|_, _| Err(OrdersServiceError::NotFound));

        strict(&mut repo);

        let res = TestClient::get(format!("http://example.com/orders/{internal_id}"))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
