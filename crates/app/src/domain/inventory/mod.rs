//! Inventory Ledger
//!
//! Owns the pool of serialised units per product. A unit only ever moves between
//! `in_stock` and `reserved`; units are never deleted.

pub mod data;
pub mod errors;
mod ledger;
pub mod records;
mod repository;
pub mod service;

pub use errors::InventoryServiceError;
pub(crate) use ledger::InventoryLedger;
pub use service::*;
