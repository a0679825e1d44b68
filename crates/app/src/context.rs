//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::{DatabaseConfig, RetryConfig},
    database::{self, Db},
    domain::{
        inventory::{InventoryService, PgInventoryService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
        provisioning::Provisioner,
        returns::{PgReturnsService, ReturnsService},
    },
    notifications::{LogRefundNotifier, RefundNotifier},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

/// Services wired once at start-up.
#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub inventory: Arc<dyn InventoryService>,
    pub orders: Arc<dyn OrdersService>,
    pub returns: Arc<dyn ReturnsService>,
    pub provisioner: Provisioner,
}

impl AppContext {
    /// Build application context from configuration, notifying refunds through the log.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(
        database: &DatabaseConfig,
        retry: &RetryConfig,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(&database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), retry, Arc::new(LogRefundNotifier)))
    }

    #[must_use]
    pub fn new(db: Db, retry: &RetryConfig, notifier: Arc<dyn RefundNotifier>) -> Self {
        let policy = retry.policy();

        let products: Arc<dyn ProductsService> = Arc::new(PgProductsService::new(db.clone()));
        let inventory: Arc<dyn InventoryService> =
            Arc::new(PgInventoryService::new(db.clone(), policy));
        let orders: Arc<dyn OrdersService> = Arc::new(PgOrdersService::new(db.clone(), policy));

        Self {
            provisioner: Provisioner::new(products.clone(), inventory.clone(), orders.clone()),
            returns: Arc::new(PgReturnsService::new(db, policy, notifier)),
            products,
            inventory,
            orders,
        }
    }
}
