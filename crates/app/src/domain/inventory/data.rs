//! Inventory Data

use crate::domain::inventory::records::InventoryUnitUuid;

/// New Inventory Unit Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryUnit {
    pub uuid: InventoryUnitUuid,
    pub serial_number: String,
}

/// Serial number for the `sequence`-th unit of a product, e.g. `ITM-001-0001`.
///
/// Padding is a minimum width, so serials do not sort in creation order past `9999`.
#[must_use]
pub fn serial_number(item_number: &str, sequence: u32) -> String {
    format!("{item_number}-{sequence:04}")
}
