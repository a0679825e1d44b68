//! Orders & Line Items

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;
pub mod status;

pub use errors::OrdersServiceError;
pub(crate) use repository::PgOrdersRepository;
pub use service::*;
