//! Storefront
//!
//! Catalog identity and retrieval primitives for the storefront: URL-safe slugs and their
//! uniqueness resolution, opaque public order tokens, public identifier parsing, validated
//! catalog queries with pagination arithmetic, and the client-held cart aggregator.
//!
//! Nothing in this crate performs I/O against the store. Persistence-facing seams are
//! expressed as traits ([`slugs::SlugRegistry`], [`cart::CartStorage`]) so the application
//! crate and clients can plug in their own backends.

pub mod cart;
pub mod catalog;
pub mod identifiers;
pub mod prelude;
pub mod requests;
pub mod slugs;
pub mod tokens;
