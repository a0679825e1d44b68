use clap::{Parser, Subcommand};
use serde::Serialize;
use stockroom_app::{
    config::{DatabaseConfig, LoggingConfig, RetryConfig},
    context::AppContext,
};

mod db;
mod inventory;
mod orders;
mod seed;

#[derive(Debug, Parser)]
#[command(name = "stockroom-app", about = "Stockroom CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    retry: RetryConfig,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Seed(seed::SeedArgs),
    Inventory(inventory::InventoryCommand),
    Orders(orders::OrdersCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let output = Output { json: self.json };

        match self.command {
            Commands::Db(command) => db::run(command, &self.database).await,
            Commands::Seed(args) => {
                let ctx = connect(&self.database, &self.retry).await?;

                seed::run(args, &ctx, output).await
            }
            Commands::Inventory(command) => {
                let ctx = connect(&self.database, &self.retry).await?;

                inventory::run(command, &ctx, output).await
            }
            Commands::Orders(command) => {
                let ctx = connect(&self.database, &self.retry).await?;

                orders::run(command, &ctx, output).await
            }
        }
    }
}

async fn connect(database: &DatabaseConfig, retry: &RetryConfig) -> Result<AppContext, String> {
    AppContext::from_config(database, retry)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))
}

/// Chooses between JSON and plain text output.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON, or hand it to `text` for plain output.
    pub(crate) fn emit<T: Serialize>(
        self,
        value: &T,
        text: impl FnOnce(&T),
    ) -> Result<(), String> {
        if self.json {
            let json = serde_json::to_string_pretty(value)
                .map_err(|error| format!("failed to encode output: {error}"))?;

            println!("{json}");
        } else {
            text(value);
        }

        Ok(())
    }
}
