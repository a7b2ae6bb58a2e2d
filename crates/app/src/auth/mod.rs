//! Authentication

mod errors;
pub mod identity;
mod models;
mod service;
mod webhook;

pub use errors::*;
pub use identity::{IdentityClaims, IdentityClient, IdentityConfig, IdentityError};
pub use models::*;
pub use service::*;
pub use webhook::*;
