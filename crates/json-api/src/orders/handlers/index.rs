//! Order Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    /// The caller's orders, newest first
    pub orders: Vec<OrderResponse>,
}

/// Order Index Handler
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Orders"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<OrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.principal_or_401()?.user_uuid;

    let orders = state
        .app
        .orders
        .list_orders(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use storefront_app::domain::orders::{MockOrdersService, models::OrderStatus};
    use testresult::TestResult;

    use crate::test_helpers::{TEST_ORDER_TOKEN, TEST_USER_UUID, TestMocks, make_order};

    use super::*;

    #[tokio::test]
    async fn test_list_orders_for_caller() -> TestResult {
        let orders = vec![
            make_order(OrderStatus::Shipped),
            make_order(OrderStatus::Pending),
        ];

        let mut repo = MockOrdersService::new();

        repo.expect_list_orders()
            .once()
            .withf(|user| *user == TEST_USER_UUID)
            .return_once(move |_| Ok(orders));

        repo.expect_create_order().never();
        repo.expect_resolve_order().never();
        repo.expect_update_order_status().never();
        repo.expect_backfill_tokens().never();

        let mut res = TestClient::get("http://example.com/orders")
            .send(
                &TestMocks::orders(repo)
                    .customer_service(Router::with_path("orders").get(handler)),
            )
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrdersResponse = res.take_json().await?;
        let statuses: Vec<&str> = body.orders.iter().map(|o| o.status.as_str()).collect();

        assert_eq!(statuses, ["shipped", "pending"]);
        assert!(body.orders.iter().all(|o| o.token == TEST_ORDER_TOKEN));

        Ok(())
    }
}
