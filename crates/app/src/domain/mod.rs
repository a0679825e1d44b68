//! Stockroom Domain Concerns

pub mod inventory;
pub mod orders;
pub mod products;
pub mod provisioning;
pub mod returns;
