//! Storefront Domain Concerns

pub mod categories;
pub mod orders;
pub mod products;
pub(crate) mod slugs;
pub mod users;
