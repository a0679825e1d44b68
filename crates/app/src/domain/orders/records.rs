//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::Serialize;

use crate::{domain::products::records::ProductUuid, uuids::TypedUuid};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Line Item UUID
pub type LineItemUuid = TypedUuid<LineItemRecord>;

/// Marker for identifiers of customers, whose accounts live outside this crate.
#[derive(Debug)]
pub struct Customer;

/// Customer UUID
pub type UserUuid = TypedUuid<Customer>;

/// Order lifecycle: `Processing -> Shipped -> Delivered -> Returned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Returned,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
        }
    }

    /// Orders in these states hold reserved inventory for their lines.
    #[must_use]
    pub const fn allocates_inventory(self) -> bool {
        matches!(self, Self::Processing | Self::Shipped | Self::Delivered)
    }

    /// Delivered orders can be returned, and returned orders keep accepting returns for
    /// whatever quantity is left.
    #[must_use]
    pub const fn accepts_returns(self) -> bool {
        matches!(self, Self::Delivered | Self::Returned)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored order status is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status `{0}`")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "returned" => Ok(Self::Returned),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

/// How much of a line item has come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnState {
    NotReturned,
    PartiallyReturned,
    FullyReturned,
}

/// Order Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub ordered_at: Timestamp,
    pub status: OrderStatus,
    /// Sum of line subtotals at creation. Returns do not change it.
    pub total: u64,
    pub shipped_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub items: Vec<LineItemRecord>,
}

impl OrderRecord {
    #[must_use]
    pub fn item(&self, line_item: LineItemUuid) -> Option<&LineItemRecord> {
        self.items.iter().find(|item| item.uuid == line_item)
    }
}

/// Line Item Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItemRecord {
    pub uuid: LineItemUuid,
    pub order_uuid: OrderUuid,
    pub position: u32,
    /// `None` for legacy lines whose product is unknown; such lines never touch inventory.
    pub product_uuid: Option<ProductUuid>,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price frozen at purchase time.
    pub price: u64,
    pub returned_quantity: u32,
}

impl LineItemRecord {
    #[must_use]
    pub fn subtotal(&self) -> u64 {
        u64::from(self.quantity).saturating_mul(self.price)
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.returned_quantity)
    }

    #[must_use]
    pub fn is_fully_returned(&self) -> bool {
        self.returned_quantity >= self.quantity
    }

    #[must_use]
    pub fn is_partially_returned(&self) -> bool {
        self.returned_quantity > 0 && self.returned_quantity < self.quantity
    }

    #[must_use]
    pub fn return_state(&self) -> ReturnState {
        if self.is_fully_returned() {
            ReturnState::FullyReturned
        } else if self.is_partially_returned() {
            ReturnState::PartiallyReturned
        } else {
            ReturnState::NotReturned
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32, returned_quantity: u32) -> LineItemRecord {
        LineItemRecord {
            uuid: LineItemUuid::new(),
            order_uuid: OrderUuid::new(),
            position: 0,
            product_uuid: None,
            product_name: "Keyboard".to_string(),
            quantity,
            price: 1000,
            returned_quantity,
        }
    }

    #[test]
    fn derived_quantities_follow_returns() {
        let item = line(3, 1);

        assert_eq!(item.subtotal(), 3000);
        assert_eq!(item.remaining(), 2);
        assert!(item.is_partially_returned());
        assert!(!item.is_fully_returned());
        assert_eq!(item.return_state(), ReturnState::PartiallyReturned);
    }

    #[test]
    fn return_state_boundaries() {
        assert_eq!(line(3, 0).return_state(), ReturnState::NotReturned);
        assert_eq!(line(3, 3).return_state(), ReturnState::FullyReturned);
    }

    #[test]
    fn only_delivered_and_returned_orders_accept_returns() {
        assert!(!OrderStatus::Processing.accepts_returns());
        assert!(!OrderStatus::Shipped.accepts_returns());
        assert!(OrderStatus::Delivered.accepts_returns());
        assert!(OrderStatus::Returned.accepts_returns());
    }

    #[test]
    fn status_round_trips_through_its_column_value() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Returned,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }
}
