//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};

use storefront_app::domain::orders::models::OrderStatus;

use crate::{
    extensions::*,
    orders::{
        errors::into_status_error,
        models::{OrderResponse, UpdateStatusRequest},
    },
    state::State,
};

/// Update Order Status Handler
///
/// Allowed moves: pending to processing to shipped to delivered, and cancellation while
/// pending or processing.
#[endpoint(
    tags("orders"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::FORBIDDEN, description = "Administrator access required"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Transition not allowed"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    token: PathParam<String>,
    json: JsonBody<UpdateStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let status = json
        .into_inner()
        .status
        .parse::<OrderStatus>()
        .or_400("invalid order status")?;

    let order = state
        .app
        .orders
        .update_order_status(&token, status)
        .await
        .map_err(into_status_error)?;

    tracing::info!(order_token = %order.token, status = %order.status, "updated order status");

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use storefront_app::domain::orders::{MockOrdersService, OrdersServiceError};
    use testresult::TestResult;

    use crate::test_helpers::{TEST_ORDER_TOKEN, TestMocks, make_order};

    use super::*;

    fn make_service(repo: MockOrdersService) -> Service {
        TestMocks::orders(repo)
            .admin_service(Router::with_path("orders/{token}/status").put(handler))
    }

    fn strict(repo: &mut MockOrdersService) {
        repo.expect_create_order().never();
        repo.expect_resolve_order().never();
        repo.expect_list_orders().never();
        repo.expect_backfill_tokens().never();
    }

    #[tokio::test]
    async fn test_update_order_status_success() -> TestResult {
        let order = make_order(OrderStatus::Processing);

        let mut repo = MockOrdersService::new();

        repo.expect_update_order_status()
            .once()
            .withf(|token, status| token == TEST_ORDER_TOKEN && *status == OrderStatus::Processing)
            .return_once(move |_, _| Ok(order));

        strict(&mut repo);

        let mut res =
            TestClient::put(format!("http://example.com/orders/{TEST_ORDER_TOKEN}/status"))
                .json(&json!({ "status": "processing" }))
                .send(&make_service(repo))
                .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(body.status, "processing");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_status_unknown_status_returns_400() -> TestResult {
        let mut repo = MockOrdersService::new();

        repo.expect_update_order_status().never();
        strict(&mut repo);

        let res = TestClient::put(format!("http://example.com/orders/{TEST_ORDER_TOKEN}/status"))
            .json(&json!({ "status": "refunded" }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_status_invalid_transition_returns_409() -> TestResult {
        let mut repo = MockOrdersService::new();

        repo.expect_update_order_status()
            .once()
            .return_once(|_, _| {
                Err(OrdersServiceError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Cancelled,
                })
            });

        strict(&mut repo);

        let res = TestClient::put(format!("http://example.com/orders/{TEST_ORDER_TOKEN}/status"))
            .json(&json!({ "status": "cancelled" }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
