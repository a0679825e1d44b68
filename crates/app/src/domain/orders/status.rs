//! Order status derivation.

use crate::domain::orders::records::{LineItemRecord, OrderStatus};

/// Status an order should have given the return state of its line items.
///
/// Any returned quantity, partial or full, puts the order in `Returned`; there is no
/// separate partial-return status. Without returns the prior status stands.
#[must_use]
pub fn derive_order_status(prior: OrderStatus, items: &[LineItemRecord]) -> OrderStatus {
    let all_fully_returned = !items.is_empty() && items.iter().all(LineItemRecord::is_fully_returned);
    let any_returned = items.iter().any(|item| item.returned_quantity > 0);

    if all_fully_returned || any_returned {
        OrderStatus::Returned
    } else {
        prior
    }
}
