//! Get Product Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use storefront::identifiers::Identifier;

use crate::{
    extensions::*,
    products::{errors::into_status_error, models::ProductResponse},
    state::State,
};

/// Get Product Handler
///
/// Resolves a product by its internal id or its slug.
#[endpoint(
    tags("products"),
    summary = "Get Product",
    responses(
        (status_code = StatusCode::OK, description = "Product found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Malformed identifier"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "products.get",
    skip(identifier, depot),
    fields(identifier = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    identifier: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    tracing::Span::current().record("identifier", identifier.as_str());

    let identifier = Identifier::parse(&identifier).or_400("invalid product identifier")?;

    let product = state
        .app
        .products
        .resolve_product(identifier)
        .await
        .map_err(into_status_error)?;

    Ok(Json(product.into()))
}
