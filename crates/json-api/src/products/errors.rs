//! Product Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::products::ProductsServiceError;

pub(crate) fn into_status_error(error: ProductsServiceError) -> StatusError {
    match error {
        ProductsServiceError::NotFound => StatusError::not_found().brief("Product not found"),
        ProductsServiceError::EmptyTitle => {
            StatusError::bad_request().brief("Product title must not be empty")
        }
        ProductsServiceError::InvalidReference => {
            StatusError::bad_request().brief("Category does not exist")
        }
        ProductsServiceError::MissingRequiredData
        | ProductsServiceError::InvalidData
        | ProductsServiceError::InvalidNumber(_) => {
            StatusError::bad_request().brief("Invalid product payload")
        }
        ProductsServiceError::SlugConflict | ProductsServiceError::SlugExhausted => {
            error!("failed to allocate product slug: {error}");

            StatusError::conflict().brief("Could not allocate a unique slug, please retry")
        }
        ProductsServiceError::Sql(source) => {
            error!("product storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
