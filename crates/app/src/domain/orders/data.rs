//! Order Data

use jiff::Timestamp;

use crate::domain::{
    orders::records::{LineItemUuid, OrderStatus, OrderUuid, UserUuid},
    products::records::ProductUuid,
};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub ordered_at: Timestamp,
    pub status: OrderStatus,
    pub shipped_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    /// Lines in display order.
    pub items: Vec<NewLineItem>,
}

impl NewOrder {
    /// A freshly placed order in `Processing`.
    #[must_use]
    pub fn processing(user_uuid: UserUuid, items: Vec<NewLineItem>) -> Self {
        Self {
            uuid: OrderUuid::new(),
            user_uuid,
            ordered_at: Timestamp::now(),
            status: OrderStatus::Processing,
            shipped_at: None,
            delivered_at: None,
            items,
        }
    }
}

/// New Line Item Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub uuid: LineItemUuid,
    pub product_uuid: Option<ProductUuid>,
    /// Name snapshot shown on the order even if the catalog changes.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price snapshot in minor currency units.
    pub price: u64,
}

/// Fulfilment milestones reported by the shipping side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfilmentEvent {
    /// Handed to the carrier. Requires `Processing`.
    Shipped { at: Timestamp },
    /// Received by the customer. Requires `Shipped`.
    Delivered { at: Timestamp },
}

impl FulfilmentEvent {
    /// Status the order must be in for this event to apply.
    #[must_use]
    pub const fn required_status(self) -> OrderStatus {
        match self {
            Self::Shipped { .. } => OrderStatus::Processing,
            Self::Delivered { .. } => OrderStatus::Shipped,
        }
    }

    /// Status the order moves to.
    #[must_use]
    pub const fn resulting_status(self) -> OrderStatus {
        match self {
            Self::Shipped { .. } => OrderStatus::Shipped,
            Self::Delivered { .. } => OrderStatus::Delivered,
        }
    }
}
