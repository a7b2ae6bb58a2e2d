//! Product Models

use jiff::Timestamp;

use crate::{domain::categories::models::CategoryUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub uuid: ProductUuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: u64,
    pub category_uuid: Option<CategoryUuid>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub stock: u32,
    pub images: Vec<String>,
    pub rating: f32,
    pub review_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: u64,
    pub category_uuid: Option<CategoryUuid>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub stock: u32,
    pub images: Vec<String>,
}

/// Product Update Model
///
/// Replaces every editable attribute. The slug is regenerated only when `title` differs from
/// the stored title.
pub type ProductUpdate = NewProduct;
