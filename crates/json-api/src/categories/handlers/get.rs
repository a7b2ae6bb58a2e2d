//! Get Category Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use storefront::identifiers::Identifier;

use crate::{
    categories::{errors::into_status_error, models::CategoryResponse},
    extensions::*,
    state::State,
};

/// Get Category Handler
///
/// Resolves a category by its internal id or its slug.
#[endpoint(
    tags("categories"),
    summary = "Get Category",
    responses(
        (status_code = StatusCode::OK, description = "Category found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Malformed identifier"),
        (status_code = StatusCode::NOT_FOUND, description = "Category not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    identifier: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<CategoryResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identifier = Identifier::parse(&identifier).or_400("invalid category identifier")?;

    let category = state
        .app
        .categories
        .resolve_category(identifier)
        .await
        .map_err(into_status_error)?;

    Ok(Json(category.into()))
}
