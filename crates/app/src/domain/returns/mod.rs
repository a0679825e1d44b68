//! Returns
//!
//! Validates return requests against an order, appends immutable return records, and puts
//! returned units back into stock.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;
pub mod validation;

pub use errors::ReturnsServiceError;
pub use service::*;
