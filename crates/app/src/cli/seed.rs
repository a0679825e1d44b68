use clap::Args;
use jiff::Timestamp;
use stockroom_app::{context::AppContext, domain::provisioning::ProvisionConfig};

use super::Output;

#[derive(Debug, Args)]
pub(crate) struct SeedArgs {
    /// Random seed for demonstration orders
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Inventory units created per product
    #[arg(long, default_value_t = 100)]
    units_per_product: u32,

    /// Number of catalog products to create
    #[arg(long, default_value_t = 25)]
    products: usize,
}

pub(crate) async fn run(args: SeedArgs, ctx: &AppContext, output: Output) -> Result<(), String> {
    let config = ProvisionConfig {
        seed: args.seed,
        units_per_product: args.units_per_product,
        products: args.products,
    };

    let summary = ctx
        .provisioner
        .provision(config, Timestamp::now())
        .await
        .map_err(|error| format!("failed to seed database: {error}"))?;

    output.emit(&summary, |summary| {
        if summary.skipped {
            println!("catalog already provisioned; nothing seeded");
        } else {
            println!("products: {}", summary.products);
            println!("inventory_units: {}", summary.units);
            println!("orders: {}", summary.orders);
        }
    })
}
