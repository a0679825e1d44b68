//! Return request validation.
//!
//! Planning is pure: it checks a whole request against a loaded order and yields the
//! entries to apply, or the first failure. Nothing is written unless planning succeeds.

use rustc_hash::FxHashMap;

use crate::domain::{
    orders::records::{LineItemUuid, OrderRecord},
    products::records::ProductUuid,
    returns::{data::ReturnLine, errors::ReturnsServiceError},
};

/// One validated return line, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReturn {
    pub line_item: LineItemUuid,
    /// Product whose units go back into stock. `None` means no inventory effects.
    pub product: Option<ProductUuid>,
    pub quantity: u32,
    pub reason: String,
    pub refund_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnPlan {
    pub entries: Vec<PlannedReturn>,
    pub refund_total: u64,
}

/// Validate `lines` against `order`.
///
/// Checks run in this order and the first failure is returned: the order accepts returns,
/// the request is not empty, then for each line in request order that it belongs to the
/// order and that its quantity is positive and within what is still returnable. Several
/// lines against the same item share that item's remaining quantity.
///
/// # Errors
///
/// Returns the first validation failure.
pub fn plan_return(
    order: &OrderRecord,
    lines: &[ReturnLine],
) -> Result<ReturnPlan, ReturnsServiceError> {
    if !order.status.accepts_returns() {
        return Err(ReturnsServiceError::OrderNotEligible {
            status: order.status,
        });
    }

    if lines.is_empty() {
        return Err(ReturnsServiceError::EmptyRequest);
    }

    let mut claimed: FxHashMap<LineItemUuid, u32> = FxHashMap::default();
    let mut entries = Vec::with_capacity(lines.len());
    let mut refund_total = 0_u64;

    for line in lines {
        let item = order
            .item(line.line_item)
            .ok_or(ReturnsServiceError::LineItemNotFound {
                line_item: line.line_item,
            })?;

        let already_claimed = claimed.entry(item.uuid).or_default();
        let returnable = item.remaining().saturating_sub(*already_claimed);

        if line.quantity == 0 || line.quantity > returnable {
            return Err(ReturnsServiceError::InvalidReturnQuantity {
                line_item: item.uuid,
                requested: line.quantity,
                returnable,
            });
        }

        *already_claimed += line.quantity;

        let refund_amount = u64::from(line.quantity)
            .checked_mul(item.price)
            .ok_or(ReturnsServiceError::RefundOverflow)?;

        refund_total = refund_total
            .checked_add(refund_amount)
            .ok_or(ReturnsServiceError::RefundOverflow)?;

        entries.push(PlannedReturn {
            line_item: item.uuid,
            product: item.product_uuid,
            quantity: line.quantity,
            reason: line.reason_or_default().to_string(),
            refund_amount,
        });
    }

    Ok(ReturnPlan {
        entries,
        refund_total,
    })
}
