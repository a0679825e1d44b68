//! Provisioner

use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use jiff::Timestamp;
use serde::Serialize;
use tracing::info;

use crate::domain::{
    inventory::InventoryService,
    orders::OrdersService,
    products::ProductsService,
    provisioning::{
        errors::ProvisionError,
        plan::{ProvisionConfig, SeedPlan},
    },
};

/// What a provisioning run created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    /// True when the catalog already had products and nothing was written.
    pub skipped: bool,
    pub products: usize,
    pub units: usize,
    pub orders: usize,
}

/// Writes a [`SeedPlan`] through the regular services, so seeded orders reserve stock
/// exactly as live orders do.
#[derive(Clone)]
pub struct Provisioner {
    products: Arc<dyn ProductsService>,
    inventory: Arc<dyn InventoryService>,
    orders: Arc<dyn OrdersService>,
}

impl Debug for Provisioner {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner").finish_non_exhaustive()
    }
}

impl Provisioner {
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductsService>,
        inventory: Arc<dyn InventoryService>,
        orders: Arc<dyn OrdersService>,
    ) -> Self {
        Self {
            products,
            inventory,
            orders,
        }
    }

    /// Seed the catalog, inventory, and demonstration orders unless a catalog exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the config is invalid or any service call fails. Writes that
    /// already succeeded are kept.
    #[tracing::instrument(
        name = "provisioning.provision",
        skip(self),
        fields(seed = config.seed),
        err
    )]
    pub async fn provision(
        &self,
        config: ProvisionConfig,
        now: Timestamp,
    ) -> Result<ProvisionSummary, ProvisionError> {
        if !self.products.list_products().await?.is_empty() {
            info!("catalog already provisioned; skipping");

            return Ok(ProvisionSummary {
                skipped: true,
                ..ProvisionSummary::default()
            });
        }

        let plan = SeedPlan::generate(config, now)?;
        let units = plan.unit_count();

        for seed in &plan.products {
            let product = self.products.create_product(seed.product.clone()).await?;

            self.inventory
                .add_units(product.uuid, seed.units.clone())
                .await?;
        }

        for order in &plan.orders {
            self.orders.create_order(order.clone()).await?;
        }

        info!(
            products = plan.products.len(),
            units,
            orders = plan.orders.len(),
            "provisioned demonstration data"
        );

        Ok(ProvisionSummary {
            skipped: false,
            products: plan.products.len(),
            units,
            orders: plan.orders.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::{
            inventory::MockInventoryService,
            orders::{MockOrdersService, records::OrderStatus},
            products::{
                MockProductsService,
                records::{ProductRecord, ProductUuid, SizeClass},
            },
        },
        test::TestContext,
    };

    use super::*;

    fn existing_product() -> ProductRecord {
        ProductRecord {
            uuid: ProductUuid::new(),
            item_number: "ITM-001".to_string(),
            name: "Wireless Mouse".to_string(),
            price: 2799,
            weight: Decimal::new(25, 2),
            size_class: SizeClass::Small,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn populated_catalog_is_left_alone() -> TestResult {
        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .times(1)
            .returning(|| Ok(vec![existing_product()]));

        products.expect_create_product().never();

        let mut inventory = MockInventoryService::new();
        inventory.expect_add_units().never();

        let mut orders = MockOrdersService::new();
        orders.expect_create_order().never();

        let provisioner =
            Provisioner::new(Arc::new(products), Arc::new(inventory), Arc::new(orders));

        let summary = provisioner
            .provision(ProvisionConfig::default(), Timestamp::now())
            .await?;

        assert!(summary.skipped);
        assert_eq!(summary.orders, 0);

        Ok(())
    }

    #[tokio::test]
    async fn invalid_config_writes_nothing() {
        let mut products = MockProductsService::new();

        products.expect_list_products().returning(|| Ok(Vec::new()));
        products.expect_create_product().never();

        let provisioner = Provisioner::new(
            Arc::new(products),
            Arc::new(MockInventoryService::new()),
            Arc::new(MockOrdersService::new()),
        );

        let result = provisioner
            .provision(
                ProvisionConfig {
                    products: 0,
                    ..ProvisionConfig::default()
                },
                Timestamp::now(),
            )
            .await;

        assert!(
            matches!(result, Err(ProvisionError::InvalidConfig(_))),
            "expected InvalidConfig, got {result:?}"
        );
    }

    #[tokio::test]
    async fn stock_short_of_seeded_orders_writes_nothing() {
        let mut products = MockProductsService::new();

        products.expect_list_products().returning(|| Ok(Vec::new()));
        products.expect_create_product().never();

        let mut inventory = MockInventoryService::new();
        inventory.expect_add_units().never();

        let mut orders = MockOrdersService::new();
        orders.expect_create_order().never();

        let provisioner =
            Provisioner::new(Arc::new(products), Arc::new(inventory), Arc::new(orders));

        let result = provisioner
            .provision(
                ProvisionConfig {
                    units_per_product: 0,
                    ..ProvisionConfig::default()
                },
                Timestamp::now(),
            )
            .await;

        assert!(
            matches!(result, Err(ProvisionError::InvalidConfig(_))),
            "expected InvalidConfig, got {result:?}"
        );
    }

    #[tokio::test]
    async fn provisioning_reserves_stock_for_open_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let provisioner = Provisioner::new(
            Arc::new(ctx.products.clone()),
            Arc::new(ctx.inventory.clone()),
            Arc::new(ctx.orders.clone()),
        );
        let config = ProvisionConfig::default();
        let now = Timestamp::now();

        let summary = provisioner.provision(config, now).await?;

        assert_eq!(summary.products, 25);
        assert_eq!(summary.units, 2500);
        assert_eq!(summary.orders, 20);

        let plan = SeedPlan::generate(config, now)?;

        let expected_reserved: u64 = plan
            .orders
            .iter()
            .filter(|order| order.status.allocates_inventory())
            .flat_map(|order| order.items.iter())
            .map(|item| u64::from(item.quantity))
            .sum();

        let inventory = ctx.inventory.inventory_summary().await?;

        let reserved: u64 = inventory.iter().map(|row| row.reserved).sum();
        let total: u64 = inventory.iter().map(|row| row.total).sum();

        assert_eq!(reserved, expected_reserved);
        assert_eq!(total, 2500);
        assert!(inventory.iter().all(|row| row.available + row.reserved == row.total));

        let returned = plan
            .orders
            .iter()
            .find(|order| order.status == OrderStatus::Returned)
            .ok_or("expected a returned order")?;

        assert_eq!(
            ctx.orders.get_order(returned.uuid).await?.status,
            OrderStatus::Returned
        );

        Ok(())
    }

    #[tokio::test]
    async fn second_run_is_skipped() -> TestResult {
        let ctx = TestContext::new().await;
        let provisioner = Provisioner::new(
            Arc::new(ctx.products.clone()),
            Arc::new(ctx.inventory.clone()),
            Arc::new(ctx.orders.clone()),
        );
        let config = ProvisionConfig::default();
        let plan = SeedPlan::generate(config, Timestamp::now())?;

        provisioner.provision(config, Timestamp::now()).await?;

        let summary = provisioner.provision(config, Timestamp::now()).await?;

        assert!(summary.skipped);
        assert_eq!(ctx.products.list_products().await?.len(), 25);

        let customer = plan
            .customers
            .first()
            .map(|customer| customer.uuid)
            .ok_or("expected a customer")?;

        assert_eq!(ctx.orders.get_orders(customer).await?.len(), 10);

        Ok(())
    }
}
