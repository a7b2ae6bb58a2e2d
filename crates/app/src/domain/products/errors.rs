//! Products service errors.

use std::num::TryFromIntError;

use sqlx::{Error, error::ErrorKind};
use storefront::slugs::SlugError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product not found")]
    NotFound,

    #[error("product title must not be empty")]
    EmptyTitle,

    #[error("product slug is already taken")]
    SlugConflict,

    #[error("no free slug found for product")]
    SlugExhausted,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("invalid numeric value")]
    InvalidNumber(#[from] TryFromIntError),
}

impl From<Error> for ProductsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(|error| error.kind()) {
            Some(ErrorKind::UniqueViolation) => Self::SlugConflict,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(_) | None => Self::Sql(error),
        }
    }
}

impl From<SlugError<Error>> for ProductsServiceError {
    fn from(error: SlugError<Error>) -> Self {
        match error {
            SlugError::Registry(error) => Self::from(error),
            SlugError::Exhausted { .. } => Self::SlugExhausted,
        }
    }
}
