//! Order Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::EmptyOrder
        | OrdersServiceError::InvalidQuantity
        | OrdersServiceError::IncompleteShipping
        | OrdersServiceError::UnknownProduct(_)
        | OrdersServiceError::TotalOverflow => StatusError::bad_request().brief(error.to_string()),
        OrdersServiceError::InvalidTransition { .. } => {
            StatusError::conflict().brief(error.to_string())
        }
        OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData
        | OrdersServiceError::InvalidNumber(_) => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::Sql(source) => {
            error!("order storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;
    use storefront_app::domain::orders::models::OrderStatus;

    use super::*;

    #[test]
    fn invalid_transition_is_conflict() {
        let error = into_status_error(OrdersServiceError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        });

        assert_eq!(error.code, StatusCode::CONFLICT);
        assert_eq!(error.brief, "cannot move order from delivered to pending");
    }
}
