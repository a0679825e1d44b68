//! Provisioning errors.

use thiserror::Error;

use crate::domain::{
    inventory::InventoryServiceError, orders::OrdersServiceError,
    products::ProductsServiceError,
};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid provisioning config: {0}")]
    InvalidConfig(String),

    #[error("seed dates out of range")]
    Timestamp(#[from] jiff::Error),

    #[error("failed to provision catalog: {0}")]
    Products(#[from] ProductsServiceError),

    #[error("failed to provision inventory: {0}")]
    Inventory(#[from] InventoryServiceError),

    #[error("failed to provision orders: {0}")]
    Orders(#[from] OrdersServiceError),
}
