//! Categories service errors.

use sqlx::{Error, error::ErrorKind};
use storefront::slugs::SlugError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategoriesServiceError {
    #[error("category not found")]
    NotFound,

    #[error("category name must not be empty")]
    EmptyName,

    #[error("category slug is already taken")]
    SlugConflict,

    #[error("no free slug found for category")]
    SlugExhausted,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CategoriesServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(|error| error.kind()) {
            Some(ErrorKind::UniqueViolation) => Self::SlugConflict,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(_) | None => Self::Sql(error),
        }
    }
}

impl From<SlugError<Error>> for CategoriesServiceError {
    fn from(error: SlugError<Error>) -> Self {
        match error {
            SlugError::Registry(error) => Self::from(error),
            SlugError::Exhausted { .. } => Self::SlugExhausted,
        }
    }
}
