use clap::{Args, Subcommand};
use stockroom_app::{context::AppContext, domain::products::records::ProductUuid};

use super::Output;

#[derive(Debug, Args)]
pub(crate) struct InventoryCommand {
    #[command(subcommand)]
    command: InventorySubcommand,
}

#[derive(Debug, Subcommand)]
enum InventorySubcommand {
    /// Stock counts per product
    Summary,

    /// Units of one product in serial order
    Units(UnitsArgs),
}

#[derive(Debug, Args)]
struct UnitsArgs {
    /// Product UUID
    #[arg(long)]
    product: ProductUuid,
}

pub(crate) async fn run(
    command: InventoryCommand,
    ctx: &AppContext,
    output: Output,
) -> Result<(), String> {
    match command.command {
        InventorySubcommand::Summary => summary(ctx, output).await,
        InventorySubcommand::Units(args) => units(args, ctx, output).await,
    }
}

async fn summary(ctx: &AppContext, output: Output) -> Result<(), String> {
    let summary = ctx
        .inventory
        .inventory_summary()
        .await
        .map_err(|error| format!("failed to load inventory summary: {error}"))?;

    output.emit(&summary, |rows| {
        for row in rows {
            println!(
                "{} {:<20} total={} available={} reserved={} returned_items={}",
                row.item_number, row.name, row.total, row.available, row.reserved, row.returned_items
            );
        }
    })
}

async fn units(args: UnitsArgs, ctx: &AppContext, output: Output) -> Result<(), String> {
    let units = ctx
        .inventory
        .list_units(args.product)
        .await
        .map_err(|error| format!("failed to list units: {error}"))?;

    output.emit(&units, |units| {
        for unit in units {
            let history = if unit.has_return_history {
                " (returned before)"
            } else {
                ""
            };

            println!("{} {}{history}", unit.serial_number, unit.status);
        }
    })
}
