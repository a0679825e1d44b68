use stockroom_app::{
    context::AppContext,
    domain::{
        orders::records::{LineItemUuid, OrderUuid},
        returns::data::ReturnLine,
    },
};

use crate::cli::Output;

/// Parse `<line-item-uuid>:<quantity>[:<reason>]`.
pub(super) fn parse_return_line(value: &str) -> Result<ReturnLine, String> {
    let mut parts = value.splitn(3, ':');

    let line_item: LineItemUuid = parts
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|error| format!("invalid line item uuid: {error}"))?;

    let quantity: u32 = parts
        .next()
        .ok_or_else(|| "missing quantity; expected <uuid>:<quantity>[:<reason>]".to_string())?
        .parse()
        .map_err(|error| format!("invalid quantity: {error}"))?;

    let line = ReturnLine::new(line_item, quantity);

    Ok(match parts.next() {
        Some(reason) => line.with_reason(reason),
        None => line,
    })
}

pub(super) async fn process(
    order: OrderUuid,
    lines: Vec<ReturnLine>,
    ctx: &AppContext,
    output: Output,
) -> Result<(), String> {
    let receipt = ctx
        .returns
        .process_return(order, lines)
        .await
        .map_err(|error| format!("failed to process return: {error}"))?;

    output.emit(&receipt, |receipt| {
        println!("order_uuid: {}", receipt.order_uuid);
        println!("status: {}", receipt.status);
        println!("refund_total: {}", receipt.refund_total);

        for record in &receipt.records {
            println!(
                "  {} qty={} refund={} reason={}",
                record.line_item_uuid, record.quantity, record.refund_amount, record.reason
            );
        }
    })
}

pub(super) async fn list(order: OrderUuid, ctx: &AppContext, output: Output) -> Result<(), String> {
    let records = ctx
        .returns
        .list_returns(order)
        .await
        .map_err(|error| format!("failed to list returns: {error}"))?;

    output.emit(&records, |records| {
        for record in records {
            println!(
                "{} {} qty={} refund={} reason={}",
                record.returned_at,
                record.line_item_uuid,
                record.quantity,
                record.refund_amount,
                record.reason
            );
        }
    })
}
