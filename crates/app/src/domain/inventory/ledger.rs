//! Transaction-scoped reserve and release.
//!
//! Both operations lock the product row first so that concurrent callers for the same
//! product queue up instead of selecting overlapping units. Checks happen before any
//! write: a shortfall leaves every unit of the product untouched.

use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::domain::{
    inventory::{
        errors::InventoryServiceError, records::InventoryUnitRecord,
        repository::PgInventoryRepository,
    },
    products::records::ProductUuid,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct InventoryLedger {
    repository: PgInventoryRepository,
}

impl InventoryLedger {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            repository: PgInventoryRepository::new(),
        }
    }

    /// Reserve the `quantity` oldest in-stock units of `product`.
    pub(crate) async fn reserve(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        if quantity == 0 {
            return Err(InventoryServiceError::InvalidQuantity);
        }

        if !self.repository.lock_product(tx, product).await? {
            return Err(InventoryServiceError::ProductNotFound);
        }

        let candidates = self
            .repository
            .select_in_stock_units(tx, product, quantity)
            .await?;

        let available = u32::try_from(candidates.len()).unwrap_or(u32::MAX);

        if available < quantity {
            warn!(
                product_uuid = %product,
                requested = quantity,
                available,
                "insufficient stock to reserve"
            );

            return Err(InventoryServiceError::InsufficientStock {
                product,
                requested: quantity,
                available,
            });
        }

        let reserved = self.repository.reserve_units(tx, &candidates).await?;

        if reserved.len() != candidates.len() {
            return Err(InventoryServiceError::Conflict);
        }

        info!(product_uuid = %product, reserved = reserved.len(), "reserved units");

        Ok(reserved)
    }

    /// Return `quantity` reserved units of `product` to stock, flagging their history.
    pub(crate) async fn release(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Vec<InventoryUnitRecord>, InventoryServiceError> {
        if quantity == 0 {
            return Err(InventoryServiceError::InvalidQuantity);
        }

        if !self.repository.lock_product(tx, product).await? {
            return Err(InventoryServiceError::ProductNotFound);
        }

        let candidates = self
            .repository
            .select_reserved_units(tx, product, quantity)
            .await?;

        let reserved = u32::try_from(candidates.len()).unwrap_or(u32::MAX);

        if reserved < quantity {
            warn!(
                product_uuid = %product,
                requested = quantity,
                reserved,
                "insufficient reserved stock to release"
            );

            return Err(InventoryServiceError::InsufficientReservedStock {
                product,
                requested: quantity,
                reserved,
            });
        }

        let released = self.repository.release_units(tx, &candidates).await?;

        if released.len() != candidates.len() {
            return Err(InventoryServiceError::Conflict);
        }

        info!(product_uuid = %product, released = released.len(), "released units");

        Ok(released)
    }
}
