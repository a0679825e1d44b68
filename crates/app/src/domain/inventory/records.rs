//! Inventory Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    domain::products::records::{ProductUuid, SizeClass},
    uuids::TypedUuid,
};

/// Inventory Unit UUID
pub type InventoryUnitUuid = TypedUuid<InventoryUnitRecord>;

/// Where a physical unit currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    InStock,
    Reserved,
}

impl UnitStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::Reserved => "reserved",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored unit status is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit status `{0}`")]
pub struct UnknownUnitStatus(pub String);

impl FromStr for UnitStatus {
    type Err = UnknownUnitStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(Self::InStock),
            "reserved" => Ok(Self::Reserved),
            other => Err(UnknownUnitStatus(other.to_string())),
        }
    }
}

/// Inventory Unit Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryUnitRecord {
    pub uuid: InventoryUnitUuid,
    /// Insertion order across all units. Reservations take the lowest first.
    pub sequence: u64,
    pub product_uuid: ProductUuid,
    pub serial_number: String,
    pub status: UnitStatus,
    /// Set the first time the unit comes back from a return; never cleared.
    pub has_return_history: bool,
    pub created_at: Timestamp,
    pub last_status_change: Option<Timestamp>,
}

/// Per-product stock counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub product_uuid: ProductUuid,
    pub item_number: String,
    pub name: String,
    pub price: u64,
    pub weight: Decimal,
    pub size_class: SizeClass,
    pub total: u64,
    pub available: u64,
    pub reserved: u64,
    /// Units flagged with return history, whatever their current status.
    pub returned_items: u64,
}
