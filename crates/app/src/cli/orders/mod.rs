use clap::{Args, Subcommand};
use stockroom_app::{
    context::AppContext,
    domain::{
        orders::records::{OrderRecord, OrderUuid, UserUuid},
        returns::data::ReturnLine,
    },
};

use super::Output;

mod returns;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// A customer's orders, newest first
    List(ListArgs),

    /// One order with its line items
    Show(OrderArgs),

    /// Return items from a delivered order
    Return(ReturnArgs),

    /// Return records of an order
    Returns(OrderArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Customer UUID
    #[arg(long)]
    user: UserUuid,
}

#[derive(Debug, Args)]
struct OrderArgs {
    /// Order UUID
    #[arg(long)]
    order: OrderUuid,
}

#[derive(Debug, Args)]
struct ReturnArgs {
    /// Order UUID
    #[arg(long)]
    order: OrderUuid,

    /// Line to return as `<line-item-uuid>:<quantity>[:<reason>]`; repeatable
    #[arg(long = "line", required = true, value_parser = returns::parse_return_line)]
    lines: Vec<ReturnLine>,
}

pub(crate) async fn run(
    command: OrdersCommand,
    ctx: &AppContext,
    output: Output,
) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::List(args) => list(args, ctx, output).await,
        OrdersSubcommand::Show(args) => show(args, ctx, output).await,
        OrdersSubcommand::Return(args) => {
            returns::process(args.order, args.lines, ctx, output).await
        }
        OrdersSubcommand::Returns(args) => returns::list(args.order, ctx, output).await,
    }
}

async fn list(args: ListArgs, ctx: &AppContext, output: Output) -> Result<(), String> {
    let orders = ctx
        .orders
        .get_orders(args.user)
        .await
        .map_err(|error| format!("failed to list orders: {error}"))?;

    output.emit(&orders, |orders| {
        for order in orders {
            println!(
                "{} {} {} total={} items={}",
                order.uuid,
                order.ordered_at,
                order.status,
                order.total,
                order.items.len()
            );
        }
    })
}

async fn show(args: OrderArgs, ctx: &AppContext, output: Output) -> Result<(), String> {
    let order = ctx
        .orders
        .get_order(args.order)
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    output.emit(&order, print_order)
}

fn print_order(order: &OrderRecord) {
    println!("order_uuid: {}", order.uuid);
    println!("user_uuid: {}", order.user_uuid);
    println!("ordered_at: {}", order.ordered_at);
    println!("status: {}", order.status);
    println!("total: {}", order.total);

    if let Some(shipped_at) = order.shipped_at {
        println!("shipped_at: {shipped_at}");
    }

    if let Some(delivered_at) = order.delivered_at {
        println!("delivered_at: {delivered_at}");
    }

    for item in &order.items {
        println!(
            "  {} {} qty={} returned={} price={}",
            item.uuid, item.product_name, item.quantity, item.returned_quantity, item.price
        );
    }
}
