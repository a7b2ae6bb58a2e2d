//! Auth service errors.

use sqlx::Error;
use thiserror::Error;

use crate::auth::IdentityError;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("principal not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("identity provider error")]
    Identity(#[from] IdentityError),
}

impl From<Error> for AuthServiceError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}
