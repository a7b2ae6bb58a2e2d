//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        Cart, CartError, CartLine, CartProduct, CartStorage, CartStorageError, FileCartStorage,
        MemoryCartStorage, PersistentCart, PersistentCartError,
    },
    catalog::{
        CatalogFilter, CatalogMode, CatalogParams, CatalogQuery, CatalogQueryError, Page,
        PageRequest, Pagination, PriceRange,
    },
    identifiers::{Identifier, IdentifierError},
    requests::{RequestSequencer, RequestTicket},
    slugs::{SlugError, SlugRegistry, generate_slug, resolve_unique, slug_or_fallback},
    tokens::{OrderToken, OrderTokenError, OrderTokenSecret},
};
