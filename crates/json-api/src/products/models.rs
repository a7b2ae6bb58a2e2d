//! Product HTTP Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront::{catalog::Pagination, identifiers::parse_internal_id};
use storefront_app::domain::{
    categories::models::CategoryUuid,
    products::models::{NewProduct, Product},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
    /// Internal id in 32 hex digit form
    pub id: String,

    /// URL-safe unique slug
    pub slug: String,

    pub title: String,

    pub description: String,

    /// The price of the product in pence/cents
    pub price: u64,

    /// Category internal id, if categorised
    pub category_id: Option<String>,

    pub colors: Vec<String>,

    pub sizes: Vec<String>,

    pub stock: u32,

    pub images: Vec<String>,

    /// Average review rating, 0 to 5
    pub rating: f32,

    pub review_count: u32,

    /// The date and time the product was created
    pub created_at: String,

    /// The date and time the product was last updated
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.uuid.to_string(),
            slug: product.slug,
            title: product.title,
            description: product.description,
            price: product.price,
            category_id: product.category_uuid.map(|uuid| uuid.to_string()),
            colors: product.colors,
            sizes: product.sizes,
            stock: product.stock,
            images: product.images,
            rating: product.rating,
            review_count: product.review_count,
            created_at: product.created_at.to_string(),
            updated_at: product.updated_at.to_string(),
        }
    }
}

/// Pagination metadata for a catalog page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct PaginationResponse {
    pub page: u32,

    pub page_size: u32,

    /// Matching items; capped at the sample size in randomized mode
    pub total: u64,

    pub total_pages: u64,

    pub has_next: bool,

    pub has_prev: bool,

    /// Alias of `has_next`
    pub has_more: bool,
}

impl From<Pagination> for PaginationResponse {
    fn from(pagination: Pagination) -> Self {
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total: pagination.total,
            total_pages: pagination.total_pages,
            has_next: pagination.has_next,
            has_prev: pagination.has_prev,
            has_more: pagination.has_more,
        }
    }
}

/// Create or replace a product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductRequest {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// The price of the product in pence/cents
    pub price: u64,

    /// Category internal id
    #[serde(default)]
    pub category_id: Option<String>,

    #[serde(default)]
    pub colors: Vec<String>,

    #[serde(default)]
    pub sizes: Vec<String>,

    #[serde(default)]
    pub stock: u32,

    #[serde(default)]
    pub images: Vec<String>,
}

impl TryFrom<ProductRequest> for NewProduct {
    type Error = InvalidCategoryId;

    fn try_from(request: ProductRequest) -> Result<Self, Self::Error> {
        let category_uuid = request
            .category_id
            .as_deref()
            .map(|id| {
                parse_internal_id(id)
                    .map(CategoryUuid::from_uuid)
                    .ok_or_else(|| InvalidCategoryId(id.to_string()))
            })
            .transpose()?;

        Ok(NewProduct {
            title: request.title,
            description: request.description,
            price: request.price,
            category_uuid,
            colors: request.colors,
            sizes: request.sizes,
            stock: request.stock,
            images: request.images,
        })
    }
}

/// `category_id` is not an internal id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("category_id \"{0}\" is not a valid id")]
pub(crate) struct InvalidCategoryId(String);
