//! Orders service errors.

use std::num::TryFromIntError;

use sqlx::{Error, error::ErrorKind};
use thiserror::Error;

use crate::domain::{
    orders::models::OrderStatus,
    products::models::ProductUuid,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("order must contain at least one line")]
    EmptyOrder,

    #[error("order line quantity must be at least 1")]
    InvalidQuantity,

    #[error("shipping details are incomplete")]
    IncompleteShipping,

    #[error("product {0} not found")]
    UnknownProduct(ProductUuid),

    #[error("order total overflows")]
    TotalOverflow,

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

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

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(|error| error.kind()) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(_) | None => Self::Sql(error),
        }
    }
}
