//! Category HTTP Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};

use storefront_app::domain::categories::models::{Category, CategoryUpdate, NewCategory};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CategoryResponse {
    /// Internal id in 32 hex digit form
    pub id: String,

    /// URL-safe unique slug
    pub slug: String,

    pub name: String,

    pub description: String,

    pub created_at: String,

    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.uuid.to_string(),
            slug: category.slug,
            name: category.name,
            description: category.description,
            created_at: category.created_at.to_string(),
            updated_at: category.updated_at.to_string(),
        }
    }
}

/// Create or rename a category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct CategoryRequest {
    pub name: String,

    #[serde(default)]
    pub description: String,
}

impl From<CategoryRequest> for NewCategory {
    fn from(request: CategoryRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
        }
    }
}

impl From<CategoryRequest> for CategoryUpdate {
    fn from(request: CategoryRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
        }
    }
}
