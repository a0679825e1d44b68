//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    database::is_transient_conflict,
    domain::{inventory::InventoryServiceError, orders::records::OrderStatus},
    retry::Retryable,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("order in status {status} is not eligible for this operation")]
    NotEligible { status: OrderStatus },

    #[error("order must contain at least one line item")]
    NoLineItems,

    #[error("line item quantity must be greater than zero")]
    InvalidQuantity,

    #[error("order total exceeds the supported amount range")]
    AmountOverflow,

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("inventory allocation failed: {0}")]
    Inventory(#[from] InventoryServiceError),

    #[error("concurrent write conflict")]
    Conflict,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        if is_transient_conflict(&error) {
            return Self::Conflict;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl Retryable for OrdersServiceError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict => true,
            Self::Inventory(error) => error.is_retryable(),
            _ => false,
        }
    }
}
