//! Create Order Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, oapi::extract::JsonBody, prelude::*};

use storefront_app::domain::orders::models::NewOrder;

use crate::{
    extensions::*,
    orders::{
        errors::into_status_error,
        models::{CreateOrderRequest, OrderResponse},
    },
    state::State,
};

/// Create Order Handler
///
/// Places an order for the caller. Titles and prices are captured from the catalog at this
/// moment; the response carries the order's public token.
#[endpoint(
    tags("orders"),
    summary = "Create Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.principal_or_401()?.user_uuid;
    let order = NewOrder::try_from(json.into_inner()).or_400("invalid order payload")?;

    let order = state
        .app
        .orders
        .create_order(user, order)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/orders/{}", order.token), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    tracing::info!(
        user_uuid = %user,
        order_token = %order.token,
        total = order.total,
        "created order"
    );

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use storefront_app::domain::{
        orders::{MockOrdersService, OrdersServiceError, models::OrderStatus},
        products::models::ProductUuid,
    };
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::test_helpers::{TEST_ORDER_TOKEN, TEST_USER_UUID, TestMocks, make_order};

    use super::*;

    fn make_service(repo: MockOrdersService) -> Service {
        TestMocks::orders(repo).customer_service(Router::with_path("orders").post(handler))
    }

    fn strict(repo: &mut MockOrdersService) {
        repo.expect_resolve_order().never();
        repo.expect_list_orders().never();
        repo.expect_update_order_status().never();
        repo.expect_backfill_tokens().never();
    }

    fn shipping() -> serde_json::Value {
        json!({
            "name": "Ada Lovelace",
            "address": "1 Analytical Way",
            "city": "London",
            "postal_code": "N1 1AA",
            "country": "GB",
        })
    }

    #[tokio::test]
    async fn test_create_order_success() -> TestResult {
        let product = ProductUuid::from_uuid(Uuid::now_v7());
        let order = make_order(OrderStatus::Pending);
        let internal_id = order.uuid.to_string();

        let mut repo = MockOrdersService::new();

        repo.expect_create_order()
            .once()
            .withf(move |user, new| {
                *user == TEST_USER_UUID
                    && new.lines.len() == 1
                    && new.lines[0].product_uuid == product
                    && new.lines[0].quantity == 2
                    && new.shipping.city == "London"
            })
            .return_once(move |_, _| Ok(order));

        strict(&mut repo);

        let mut res = TestClient::post("http://example.com/orders")
            .json(&json!({
                "items": [{ "product_id": product.to_string(), "quantity": 2 }],
                "shipping": shipping(),
            }))
            .send(&make_service(repo))
            .await;

        let location = res
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/orders/{TEST_ORDER_TOKEN}")));

        let body = res.take_string().await?;

        assert!(body.contains(TEST_ORDER_TOKEN), "{body}");
        assert!(!body.contains(&internal_id), "internal id leaked: {body}");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_malformed_product_id_returns_400() -> TestResult {
        let mut repo = MockOrdersService::new();

        repo.expect_create_order().never();
        strict(&mut repo);

        let res = TestClient::post("http://example.com/orders")
            .json(&json!({
                "items": [{ "product_id": "blue-tee", "quantity": 1 }],
                "shipping": shipping(),
            }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_empty_order_returns_400() -> TestResult {
        let mut repo = MockOrdersService::new();

        repo.expect_create_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::EmptyOrder));

        strict(&mut repo);

        let res = TestClient::post("http://example.com/orders")
            .json(&json!({ "items": [], "shipping": shipping() }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_without_principal_returns_401() -> TestResult {
        let mut repo = MockOrdersService::new();

        repo.expect_create_order().never();
        strict(&mut repo);

        let res = TestClient::post("http://example.com/orders")
            .json(&json!({ "items": [], "shipping": shipping() }))
            .send(
                &TestMocks::orders(repo)
                    .public_service(Router::with_path("orders").post(handler)),
            )
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
