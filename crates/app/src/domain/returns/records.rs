//! Return Records

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::orders::records::{LineItemUuid, OrderStatus, OrderUuid},
    uuids::TypedUuid,
};

/// Return Record UUID
pub type ReturnRecordUuid = TypedUuid<ReturnRecord>;

/// Immutable ledger entry for one return against one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnRecord {
    pub uuid: ReturnRecordUuid,
    pub line_item_uuid: LineItemUuid,
    pub quantity: u32,
    pub reason: String,
    /// `quantity` times the line item's frozen unit price.
    pub refund_amount: u64,
    pub returned_at: Timestamp,
}

/// Outcome of a processed return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnReceipt {
    pub order_uuid: OrderUuid,
    pub status: OrderStatus,
    pub refund_total: u64,
    pub records: Vec<ReturnRecord>,
}
