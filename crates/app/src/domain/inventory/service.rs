//! Inventory service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        inventory::{
            data::NewInventoryUnit,
            errors::InventoryServiceError,
            ledger::InventoryLedger,
            records::{InventorySummary, InventoryUnitRecord},
            repository::PgInventoryRepository,
        },
        products::records::ProductUuid,
    },
    retry::{RetryPolicy, retry_on_conflict},
};

#[derive(Debug, Clone)]
pub struct PgInventoryService {
    db: Db,
    ledger: InventoryLedger,
    repository: PgInventoryRepository,
    retry: RetryPolicy,
}

impl PgInventoryService {
    #[must_use]
    pub fn new(db: Db, retry: RetryPolicy) -> Self {
        Self {
            db,
            ledger: InventoryLedger::new(),
            repository: PgInventoryRepository::new(),
            retry,
        }
    }

    async fn reserve_once(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let reserved = self.ledger.reserve(&mut tx, product, quantity).await?;

        tx.commit().await?;

        Ok(reserved)
    }

    async fn release_once(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let released = self.ledger.release(&mut tx, product, quantity).await?;

        tx.commit().await?;

        Ok(released)
    }
}

#[async_trait]
impl InventoryService for PgInventoryService {
    #[tracing::instrument(
        name = "inventory.service.add_units",
        skip(self, units),
        fields(product_uuid = %product, unit_count = units.len()),
        err
    )]
    async fn add_units(
        &self,
        product: ProductUuid,
        units: Vec<NewInventoryUnit>,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_units(&mut tx, product, units).await?;

        tx.commit().await?;

        info!(product_uuid = %product, created = created.len(), "added inventory units");

        Ok(created)
    }

    #[tracing::instrument(
        name = "inventory.service.reserve",
        skip(self),
        fields(product_uuid = %product, quantity),
        err
    )]
    async fn reserve(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        retry_on_conflict(self.retry, "inventory.reserve", move || {
            self.reserve_once(product, quantity)
        })
        .await
    }

    #[tracing::instrument(
        name = "inventory.service.release",
        skip(self),
        fields(product_uuid = %product, quantity),
        err
    )]
    async fn release(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        retry_on_conflict(self.retry, "inventory.release", move || {
            self.release_once(product, quantity)
        })
        .await
    }

    async fn available_stock(&self, product: ProductUuid) -> Result<u64, InventoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let available = self
            .repository
            .count_available_units(&mut tx, product)
            .await?;

        tx.commit().await?;

        Ok(available)
    }

    async fn list_units(
        &self,
        product: ProductUuid,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let units = self.repository.list_units(&mut tx, product).await?;

        tx.commit().await?;

        Ok(units)
    }

    async fn inventory_summary(&self) -> Result<Vec<InventorySummary>, InventoryServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let summary = self.repository.inventory_summary(&mut tx).await?;

        tx.commit().await?;

        Ok(summary)
    }
}

#[automock]
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Registers new serialised units for a product, all in stock.
    async fn add_units(
        &self,
        product: ProductUuid,
        units: Vec<NewInventoryUnit>,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError>;

    /// Reserves the `quantity` oldest in-stock units. All or nothing.
    async fn reserve(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError>;

    /// Moves `quantity` reserved units back into stock and flags their return history.
    async fn release(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError>;

    /// Number of in-stock units. Unknown products have zero.
    async fn available_stock(&self, product: ProductUuid) -> Result<u64, InventoryServiceError>;

    /// All units of a product in serial order.
    async fn list_units(
        &self,
        product: ProductUuid,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError>;

    /// Stock counts for every catalog product, ordered by item number.
    async fn inventory_summary(&self) -> Result<Vec<InventorySummary>, InventoryServiceError>;
}
