//! Returns service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    database::is_transient_conflict,
    domain::{
        inventory::InventoryServiceError,
        orders::records::{LineItemUuid, OrderStatus},
    },
    retry::Retryable,
};

#[derive(Debug, Error)]
pub enum ReturnsServiceError {
    #[error("order not found")]
    OrderNotFound,

    #[error("order in status {status} cannot be returned")]
    OrderNotEligible { status: OrderStatus },

    #[error("line item {line_item} does not belong to the order")]
    LineItemNotFound { line_item: LineItemUuid },

    #[error("cannot return {requested} of line item {line_item}: {returnable} returnable")]
    InvalidReturnQuantity {
        line_item: LineItemUuid,
        requested: u32,
        returnable: u32,
    },

    #[error("return request contains no lines")]
    EmptyRequest,

    #[error("refund exceeds the supported amount range")]
    RefundOverflow,

    #[error("invalid data")]
    InvalidData,

    #[error("inventory release failed: {0}")]
    Inventory(#[from] InventoryServiceError),

    #[error("concurrent write conflict")]
    Conflict,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ReturnsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::OrderNotFound;
        }

        if is_transient_conflict(&error) {
            return Self::Conflict;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(
                ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::UniqueViolation,
            ) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl Retryable for ReturnsServiceError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict => true,
            Self::Inventory(error) => error.is_retryable(),
            _ => false,
        }
    }
}
