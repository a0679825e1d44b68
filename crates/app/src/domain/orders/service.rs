//! Orders service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        inventory::InventoryLedger,
        orders::{
            data::{FulfilmentEvent, NewOrder},
            errors::OrdersServiceError,
            records::{OrderRecord, OrderUuid, UserUuid},
            repository::PgOrdersRepository,
        },
        products::records::ProductUuid,
    },
    retry::{RetryPolicy, retry_on_conflict},
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    ledger: InventoryLedger,
    repository: PgOrdersRepository,
    retry: RetryPolicy,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, retry: RetryPolicy) -> Self {
        Self {
            db,
            ledger: InventoryLedger::new(),
            repository: PgOrdersRepository::new(),
            retry,
        }
    }

    async fn create_order_once(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let total = order_total(&order)?;

        let mut tx = self.db.begin_transaction().await?;

        let mut created = self.repository.create_order(&mut tx, &order, total).await?;

        for (position, item) in (0_u32..).zip(&order.items) {
            let line = self
                .repository
                .create_line_item(&mut tx, created.uuid, position, item)
                .await?;

            created.items.push(line);
        }

        if order.status.allocates_inventory() {
            // BTreeMap keeps product locks in ascending id order across concurrent orders.
            for (product, quantity) in allocation_by_product(&order)? {
                self.ledger.reserve(&mut tx, product, quantity).await?;
            }
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn record_fulfilment_once(
        &self,
        order: OrderUuid,
        event: FulfilmentEvent,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.repository.lock_order(&mut tx, order).await?;

        if current.status != event.required_status() {
            return Err(OrdersServiceError::NotEligible {
                status: current.status,
            });
        }

        let (shipped_at, delivered_at) = match event {
            FulfilmentEvent::Shipped { at } => (Some(at), None),
            FulfilmentEvent::Delivered { at } => (None, Some(at)),
        };

        let updated = self
            .repository
            .update_status(
                &mut tx,
                order,
                event.resulting_status(),
                shipped_at,
                delivered_at,
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }
}

fn order_total(order: &NewOrder) -> Result<u64, OrdersServiceError> {
    if order.items.is_empty() {
        return Err(OrdersServiceError::NoLineItems);
    }

    order.items.iter().try_fold(0_u64, |total, item| {
        if item.quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity);
        }

        u64::from(item.quantity)
            .checked_mul(item.price)
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or(OrdersServiceError::AmountOverflow)
    })
}

/// Quantity to reserve per product. Lines without a product are skipped.
fn allocation_by_product(
    order: &NewOrder,
) -> Result<BTreeMap<ProductUuid, u32>, OrdersServiceError> {
    let mut allocation = BTreeMap::new();

    for item in &order.items {
        let Some(product) = item.product_uuid else {
            continue;
        };

        let quantity: &mut u32 = allocation.entry(product).or_default();

        *quantity = quantity
            .checked_add(item.quantity)
            .ok_or(OrdersServiceError::InvalidQuantity)?;
    }

    Ok(allocation)
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            order_uuid = %order.uuid,
            user_uuid = %order.user_uuid,
            status = %order.status,
            line_count = order.items.len()
        ),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let created = retry_on_conflict(self.retry, "orders.create_order", || {
            self.create_order_once(order.clone())
        })
        .await?;

        info!(
            order_uuid = %created.uuid,
            status = %created.status,
            total = created.total,
            "created order"
        );

        Ok(created)
    }

    async fn get_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.repository.list_orders_by_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.repository.get_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.service.record_fulfilment",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn record_fulfilment(
        &self,
        order: OrderUuid,
        event: FulfilmentEvent,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let updated = retry_on_conflict(self.retry, "orders.record_fulfilment", move || {
            self.record_fulfilment_once(order, event)
        })
        .await?;

        info!(order_uuid = %updated.uuid, status = %updated.status, "recorded fulfilment");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Stores an order with its lines and, unless the order is already returned, reserves
    /// inventory for every line that references a product. Nothing is stored when any
    /// product is short of stock.
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    /// A customer's orders, newest first, with their line items.
    async fn get_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Retrieve a single order with its line items.
    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    /// Applies a shipping milestone reported by fulfilment.
    async fn record_fulfilment(
        &self,
        order: OrderUuid,
        event: FulfilmentEvent,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, ToSpan};
    use testresult::TestResult;

    use crate::{
        domain::{
            inventory::{InventoryService, InventoryServiceError},
            orders::records::OrderStatus,
        },
        test::{
            TestContext,
            helpers::{legacy_line, line_for, stock_product},
        },
    };

    use super::*;

    #[test]
    fn order_total_sums_line_subtotals() -> TestResult {
        let order = NewOrder::processing(
            UserUuid::new(),
            vec![legacy_line(3, 1000), legacy_line(1, 2599)],
        );

        assert_eq!(order_total(&order)?, 5599);

        Ok(())
    }

    #[test]
    fn order_total_rejects_overflow() {
        let order = NewOrder::processing(UserUuid::new(), vec![legacy_line(2, u64::MAX)]);

        assert!(matches!(
            order_total(&order),
            Err(OrdersServiceError::AmountOverflow)
        ));
    }

    #[test]
    fn allocation_aggregates_lines_of_the_same_product() -> TestResult {
        let product = ProductUuid::new();
        let mut first = legacy_line(2, 100);
        let mut second = legacy_line(1, 100);

        first.product_uuid = Some(product);
        second.product_uuid = Some(product);

        let order = NewOrder::processing(
            UserUuid::new(),
            vec![first, legacy_line(5, 100), second],
        );

        let allocation = allocation_by_product(&order)?;

        assert_eq!(allocation.len(), 1);
        assert_eq!(allocation.get(&product), Some(&3));

        Ok(())
    }

    #[tokio::test]
    async fn create_order_reserves_inventory_for_product_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let keyboard = stock_product(&ctx, "ITM-001", 4999, 5).await?;

        let order = NewOrder::processing(
            UserUuid::new(),
            vec![line_for(&keyboard, 2), legacy_line(1, 500)],
        );

        let created = ctx.orders.create_order(order).await?;

        assert_eq!(created.status, OrderStatus::Processing);
        assert_eq!(created.total, 2 * 4999 + 500);
        assert_eq!(created.items.len(), 2);
        assert_eq!(ctx.inventory.available_stock(keyboard.uuid).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn create_order_with_insufficient_stock_stores_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let keyboard = stock_product(&ctx, "ITM-001", 4999, 5).await?;
        let mouse = stock_product(&ctx, "ITM-002", 2599, 1).await?;
        let user = UserUuid::new();

        let order = NewOrder::processing(user, vec![line_for(&keyboard, 2), line_for(&mouse, 2)]);

        let result = ctx.orders.create_order(order).await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Inventory(
                    InventoryServiceError::InsufficientStock { .. }
                ))
            ),
            "expected InsufficientStock, got {result:?}"
        );

        assert_eq!(ctx.inventory.available_stock(keyboard.uuid).await?, 5);
        assert_eq!(ctx.inventory.available_stock(mouse.uuid).await?, 1);
        assert!(ctx.orders.get_orders(user).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn returned_orders_do_not_allocate() -> TestResult {
        let ctx = TestContext::new().await;
        let keyboard = stock_product(&ctx, "ITM-001", 4999, 2).await?;

        let mut order = NewOrder::processing(UserUuid::new(), vec![line_for(&keyboard, 2)]);
        order.status = OrderStatus::Returned;

        ctx.orders.create_order(order).await?;

        assert_eq!(ctx.inventory.available_stock(keyboard.uuid).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn create_order_without_items_is_rejected() {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .create_order(NewOrder::processing(UserUuid::new(), Vec::new()))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::NoLineItems)),
            "expected NoLineItems, got {result:?}"
        );
    }

    #[tokio::test]
    async fn get_orders_returns_newest_first_with_items() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let now = Timestamp::now();

        let mut older = NewOrder::processing(user, vec![legacy_line(1, 100)]);
        older.ordered_at = now.checked_sub(48.hours())?;

        let mut newer = NewOrder::processing(user, vec![legacy_line(1, 200), legacy_line(2, 50)]);
        newer.ordered_at = now.checked_sub(1.hour())?;

        ctx.orders.create_order(older.clone()).await?;
        ctx.orders.create_order(newer.clone()).await?;
        ctx.orders
            .create_order(NewOrder::processing(UserUuid::new(), vec![legacy_line(1, 1)]))
            .await?;

        let orders = ctx.orders.get_orders(user).await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|o| o.uuid).collect();

        assert_eq!(uuids, [newer.uuid, older.uuid]);

        let positions: Vec<u32> = orders
            .first()
            .map(|order| order.items.iter().map(|item| item.position).collect())
            .unwrap_or_default();

        assert_eq!(positions, [0, 1]);

        Ok(())
    }

    #[tokio::test]
    async fn get_order_is_stable_between_reads() -> TestResult {
        let ctx = TestContext::new().await;
        let keyboard = stock_product(&ctx, "ITM-001", 4999, 3).await?;

        let created = ctx
            .orders
            .create_order(NewOrder::processing(UserUuid::new(), vec![line_for(&keyboard, 1)]))
            .await?;

        let first = ctx.orders.get_order(created.uuid).await?;
        let second = ctx.orders.get_order(created.uuid).await?;

        assert_eq!(first, second);
        assert_eq!(first.items, created.items);

        Ok(())
    }

    #[tokio::test]
    async fn get_order_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.orders.get_order(OrderUuid::new()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn fulfilment_moves_order_through_shipping_and_delivery() -> TestResult {
        let ctx = TestContext::new().await;
        let created = ctx
            .orders
            .create_order(NewOrder::processing(UserUuid::new(), vec![legacy_line(1, 100)]))
            .await?;

        let shipped_at = Timestamp::now();
        let delivered_at = shipped_at.checked_add(72.hours())?;

        let shipped = ctx
            .orders
            .record_fulfilment(created.uuid, FulfilmentEvent::Shipped { at: shipped_at })
            .await?;

        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert!(shipped.shipped_at.is_some());

        let delivered = ctx
            .orders
            .record_fulfilment(created.uuid, FulfilmentEvent::Delivered { at: delivered_at })
            .await?;

        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.shipped_at, shipped.shipped_at);
        assert!(delivered.delivered_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn delivering_an_unshipped_order_is_not_eligible() -> TestResult {
        let ctx = TestContext::new().await;
        let created = ctx
            .orders
            .create_order(NewOrder::processing(UserUuid::new(), vec![legacy_line(1, 100)]))
            .await?;

        let result = ctx
            .orders
            .record_fulfilment(
                created.uuid,
                FulfilmentEvent::Delivered {
                    at: Timestamp::now(),
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::NotEligible {
                    status: OrderStatus::Processing
                })
            ),
            "expected NotEligible, got {result:?}"
        );

        Ok(())
    }
}
