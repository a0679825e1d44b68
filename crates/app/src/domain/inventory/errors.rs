//! Inventory service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    database::is_transient_conflict, domain::products::records::ProductUuid, retry::Retryable,
};

#[derive(Debug, Error)]
pub enum InventoryServiceError {
    #[error("product not found")]
    ProductNotFound,

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductUuid,
        requested: u32,
        available: u32,
    },

    #[error(
        "insufficient reserved stock for product {product}: requested {requested}, reserved {reserved}"
    )]
    InsufficientReservedStock {
        product: ProductUuid,
        requested: u32,
        reserved: u32,
    },

    #[error("inventory unit already exists")]
    AlreadyExists,

    #[error("invalid data")]
    InvalidData,

    #[error("concurrent write conflict")]
    Conflict,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for InventoryServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::ProductNotFound;
        }

        if is_transient_conflict(&error) {
            return Self::Conflict;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::ProductNotFound,
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl Retryable for InventoryServiceError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}
