//! Catalog and demonstration data provisioning.

pub mod catalog;
pub mod errors;
pub mod plan;
pub mod service;

pub use errors::ProvisionError;
pub use plan::{ProvisionConfig, SeedPlan};
pub use service::{ProvisionSummary, Provisioner};
