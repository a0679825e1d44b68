//! Returns service.

use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::{
    database::Db,
    domain::{
        inventory::{InventoryLedger, InventoryServiceError},
        orders::{
            PgOrdersRepository,
            records::OrderUuid,
            status::derive_order_status,
        },
        returns::{
            data::ReturnLine,
            errors::ReturnsServiceError,
            records::{ReturnReceipt, ReturnRecord},
            repository::PgReturnsRepository,
            validation::{PlannedReturn, plan_return},
        },
    },
    notifications::{RefundNotice, RefundNotifier},
    retry::{RetryPolicy, retry_on_conflict},
};

#[derive(Clone)]
pub struct PgReturnsService {
    db: Db,
    ledger: InventoryLedger,
    orders: PgOrdersRepository,
    repository: PgReturnsRepository,
    notifier: Arc<dyn RefundNotifier>,
    retry: RetryPolicy,
}

impl Debug for PgReturnsService {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgReturnsService")
            .field("db", &self.db)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl PgReturnsService {
    #[must_use]
    pub fn new(db: Db, retry: RetryPolicy, notifier: Arc<dyn RefundNotifier>) -> Self {
        Self {
            db,
            ledger: InventoryLedger::new(),
            orders: PgOrdersRepository::new(),
            repository: PgReturnsRepository::new(),
            notifier,
            retry,
        }
    }

    async fn process_return_once(
        &self,
        order: OrderUuid,
        lines: &[ReturnLine],
    ) -> Result<ReturnReceipt, ReturnsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders.lock_order(&mut tx, order).await?;

        let plan = plan_return(&current, lines)?;

        let mut records = Vec::with_capacity(plan.entries.len());

        for entry in &plan.entries {
            let returned = self
                .repository
                .increment_returned_quantity(&mut tx, entry.line_item, entry.quantity)
                .await?;

            // The order lock makes this unreachable unless the row changed underneath us.
            if returned.is_none() {
                return Err(ReturnsServiceError::Conflict);
            }

            records.push(self.repository.create_return_record(&mut tx, entry).await?);
        }

        self.release_units(&mut tx, &plan.entries).await?;

        let updated = self.orders.get_order(&mut tx, order).await?;
        let status = derive_order_status(current.status, &updated.items);

        if status != current.status {
            self.orders
                .update_status(&mut tx, order, status, None, None)
                .await?;
        }

        tx.commit().await?;

        Ok(ReturnReceipt {
            order_uuid: order,
            status,
            refund_total: plan.refund_total,
            records,
        })
    }

    /// Put returned units back into stock.
    ///
    /// A release the ledger cannot satisfy is logged and skipped; the return records stay
    /// authoritative. Products are visited in id order so concurrent returns lock them
    /// consistently.
    async fn release_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entries: &[PlannedReturn],
    ) -> Result<(), ReturnsServiceError> {
        let mut releases: Vec<&PlannedReturn> = entries.iter().collect();

        releases.sort_by_key(|entry| entry.product);

        for entry in releases {
            let Some(product) = entry.product else {
                debug!(
                    line_item_uuid = %entry.line_item,
                    "line item has no product; no inventory to release"
                );

                continue;
            };

            match self.ledger.release(tx, product, entry.quantity).await {
                Ok(_) => {}
                Err(
                    error @ (InventoryServiceError::InsufficientReservedStock { .. }
                    | InventoryServiceError::ProductNotFound),
                ) => {
                    warn!(
                        line_item_uuid = %entry.line_item,
                        product_uuid = %product,
                        quantity = entry.quantity,
                        %error,
                        "skipped inventory release for returned item"
                    );
                }
                Err(error) => return Err(error.into()),
            }
        }

        Ok(())
    }

    async fn notify(&self, receipt: &ReturnReceipt) {
        let notice = RefundNotice {
            order_uuid: receipt.order_uuid,
            refund_total: receipt.refund_total,
        };

        if let Err(error) = self.notifier.notify_refund(notice).await {
            warn!(
                order_uuid = %receipt.order_uuid,
                refund_total = receipt.refund_total,
                %error,
                "refund notification failed"
            );
        }
    }
}

fn audit(receipt: &ReturnReceipt) {
    for record in &receipt.records {
        info!(
            target: "audit",
            order_uuid = %receipt.order_uuid,
            return_uuid = %record.uuid,
            line_item_uuid = %record.line_item_uuid,
            quantity = record.quantity,
            refund_amount = record.refund_amount,
            reason = %record.reason,
            "return recorded"
        );
    }
}

#[async_trait]
impl ReturnsService for PgReturnsService {
    #[tracing::instrument(
        name = "returns.service.process_return",
        skip(self, lines),
        fields(order_uuid = %order, line_count = lines.len()),
        err
    )]
    async fn process_return(
        &self,
        order: OrderUuid,
        lines: Vec<ReturnLine>,
    ) -> Result<ReturnReceipt, ReturnsServiceError> {
        let receipt = retry_on_conflict(self.retry, "returns.process_return", || {
            self.process_return_once(order, &lines)
        })
        .await?;

        audit(&receipt);

        info!(
            order_uuid = %receipt.order_uuid,
            status = %receipt.status,
            refund_total = receipt.refund_total,
            line_count = receipt.records.len(),
            "processed return"
        );

        self.notify(&receipt).await;

        Ok(receipt)
    }

    async fn list_returns(&self, order: OrderUuid) -> Result<Vec<ReturnRecord>, ReturnsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        if !self.orders.order_exists(&mut tx, order).await? {
            return Err(ReturnsServiceError::OrderNotFound);
        }

        let records = self.repository.list_returns_for_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(records)
    }
}

#[automock]
#[async_trait]
pub trait ReturnsService: Send + Sync {
    /// Validates and applies a return against a delivered (or already returned) order.
    ///
    /// The whole request is applied or none of it is. The refund notifier is told about
    /// the refund after commit; its failure does not fail the return.
    async fn process_return(
        &self,
        order: OrderUuid,
        lines: Vec<ReturnLine>,
    ) -> Result<ReturnReceipt, ReturnsServiceError>;

    /// Return records of an order, oldest first.
    async fn list_returns(&self, order: OrderUuid) -> Result<Vec<ReturnRecord>, ReturnsServiceError>;
}

#[cfg(test)]
mod tests {

    use rustc_hash::FxHashMap;
    use testresult::TestResult;

    use crate::{
        domain::{
            inventory::{InventoryService, records::UnitStatus},
            orders::{
                OrdersService,
                data::NewOrder,
                records::{LineItemUuid, OrderStatus, UserUuid},
            },
        },
        notifications::{MockRefundNotifier, NotificationError},
        test::{
            TestContext,
            helpers::{delivered_order, legacy_line, line_for, stock_product},
        },
    };

    use super::*;

    #[tokio::test]
    async fn partial_return_refunds_records_and_restocks() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 5).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 3)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        let receipt = ctx
            .returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 2).with_reason("damaged")])
            .await?;

        assert_eq!(receipt.refund_total, 2000);
        assert_eq!(receipt.status, OrderStatus::Returned);
        assert_eq!(receipt.records.len(), 1);

        let Some(record) = receipt.records.first() else {
            return Err("expected a return record".into());
        };

        assert_eq!(record.quantity, 2);
        assert_eq!(record.refund_amount, 2000);
        assert_eq!(record.reason, "damaged");

        let reloaded = ctx.orders.get_order(order.uuid).await?;

        assert_eq!(reloaded.status, OrderStatus::Returned);
        assert_eq!(reloaded.item(line).map(|item| item.returned_quantity), Some(2));

        let units = ctx.inventory.list_units(product.uuid).await?;
        let restocked: Vec<_> = units.iter().filter(|u| u.has_return_history).collect();

        assert_eq!(restocked.len(), 2);
        assert!(restocked.iter().all(|u| u.status == UnitStatus::InStock));
        assert_eq!(ctx.inventory.available_stock(product.uuid).await?, 4);

        Ok(())
    }

    #[tokio::test]
    async fn returning_more_than_remaining_is_rejected_and_changes_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 5).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 3)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        ctx.returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 2).with_reason("damaged")])
            .await?;

        let result = ctx
            .returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 2).with_reason("again")])
            .await;

        assert!(
            matches!(
                result,
                Err(ReturnsServiceError::InvalidReturnQuantity {
                    requested: 2,
                    returnable: 1,
                    ..
                })
            ),
            "expected InvalidReturnQuantity, got {result:?}"
        );

        assert_eq!(ctx.returns.list_returns(order.uuid).await?.len(), 1);
        assert_eq!(ctx.inventory.available_stock(product.uuid).await?, 4);

        Ok(())
    }

    #[tokio::test]
    async fn processing_order_is_not_eligible() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 5).await?;
        let order = ctx
            .orders
            .create_order(NewOrder::processing(UserUuid::new(), vec![line_for(&product, 1)]))
            .await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        let result = ctx
            .returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 1)])
            .await;

        assert!(
            matches!(
                result,
                Err(ReturnsServiceError::OrderNotEligible {
                    status: OrderStatus::Processing
                })
            ),
            "expected OrderNotEligible, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .returns
            .process_return(OrderUuid::new(), vec![ReturnLine::new(LineItemUuid::new(), 1)])
            .await;

        assert!(
            matches!(result, Err(ReturnsServiceError::OrderNotFound)),
            "expected OrderNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn listing_returns_of_unknown_order_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.returns.list_returns(OrderUuid::new()).await;

        assert!(
            matches!(result, Err(ReturnsServiceError::OrderNotFound)),
            "expected OrderNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn invalid_line_rolls_back_the_whole_request() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 5).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 1), line_for(&product, 1)])
            .await?;
        let lines: Vec<LineItemUuid> = order.items.iter().map(|item| item.uuid).collect();
        let [first, second] = lines.as_slice() else {
            return Err("expected two line items".into());
        };
        let (first, second) = (*first, *second);

        let result = ctx
            .returns
            .process_return(
                order.uuid,
                vec![ReturnLine::new(first, 1), ReturnLine::new(second, 2)],
            )
            .await;

        assert!(
            matches!(result, Err(ReturnsServiceError::InvalidReturnQuantity { line_item, .. }) if line_item == second),
            "expected InvalidReturnQuantity, got {result:?}"
        );

        let reloaded = ctx.orders.get_order(order.uuid).await?;

        assert_eq!(reloaded.status, OrderStatus::Delivered);
        assert!(reloaded.items.iter().all(|item| item.returned_quantity == 0));
        assert!(ctx.returns.list_returns(order.uuid).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn returned_order_keeps_accepting_remaining_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 5).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 3)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        ctx.returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 1)])
            .await?;

        let receipt = ctx
            .returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 2)])
            .await?;

        assert_eq!(receipt.status, OrderStatus::Returned);
        assert_eq!(receipt.refund_total, 2000);

        let reloaded = ctx.orders.get_order(order.uuid).await?;

        assert!(reloaded.items.iter().all(|item| item.is_fully_returned()));

        Ok(())
    }

    #[tokio::test]
    async fn return_records_sum_to_returned_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 10).await?;
        let other = stock_product(&ctx, "ITM-002", 250, 10).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 3), line_for(&other, 2)])
            .await?;
        let lines: Vec<LineItemUuid> = order.items.iter().map(|item| item.uuid).collect();

        for line in &lines {
            ctx.returns
                .process_return(order.uuid, vec![ReturnLine::new(*line, 1)])
                .await?;
        }

        if let Some(first) = lines.first() {
            ctx.returns
                .process_return(
                    order.uuid,
                    vec![ReturnLine::new(*first, 1), ReturnLine::new(*first, 1)],
                )
                .await?;
        }

        let mut recorded: FxHashMap<LineItemUuid, u32> = FxHashMap::default();

        for record in ctx.returns.list_returns(order.uuid).await? {
            *recorded.entry(record.line_item_uuid).or_default() += record.quantity;
        }

        let reloaded = ctx.orders.get_order(order.uuid).await?;

        for item in &reloaded.items {
            assert!(item.returned_quantity <= item.quantity);
            assert_eq!(
                recorded.get(&item.uuid).copied().unwrap_or_default(),
                item.returned_quantity,
                "ledger sum must match returned quantity for {}",
                item.uuid
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_returns_never_exceed_purchased_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 5).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 3)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        let mut handles = Vec::new();

        for _ in 0..3 {
            let returns = ctx.returns.clone();
            let order = order.uuid;

            handles.push(tokio::spawn(async move {
                returns
                    .process_return(order, vec![ReturnLine::new(line, 2)])
                    .await
            }));
        }

        let mut accepted = 0;

        for handle in handles {
            match handle.await? {
                Ok(_) => accepted += 1,
                Err(ReturnsServiceError::InvalidReturnQuantity { .. }) => {}
                Err(error) => return Err(error.into()),
            }
        }

        assert_eq!(accepted, 1, "only one return of two fits in a quantity of three");

        let reloaded = ctx.orders.get_order(order.uuid).await?;

        assert_eq!(reloaded.item(line).map(|item| item.returned_quantity), Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn release_shortfall_does_not_abort_the_return() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 5).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 2)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        // Units released outside the normal flow leave nothing reserved for this line.
        ctx.inventory.release(product.uuid, 2).await?;

        let receipt = ctx
            .returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 2)])
            .await?;

        assert_eq!(receipt.refund_total, 2000);
        assert_eq!(receipt.records.len(), 1);
        assert_eq!(ctx.inventory.available_stock(product.uuid).await?, 5);

        Ok(())
    }

    #[tokio::test]
    async fn lines_without_product_skip_inventory() -> TestResult {
        let ctx = TestContext::new().await;
        let order = delivered_order(&ctx, vec![legacy_line(2, 700)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        let receipt = ctx
            .returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 1)])
            .await?;

        assert_eq!(receipt.refund_total, 700);
        assert_eq!(receipt.status, OrderStatus::Returned);

        Ok(())
    }

    #[tokio::test]
    async fn notifier_receives_refund_total() -> TestResult {
        let mut notifier = MockRefundNotifier::new();

        notifier
            .expect_notify_refund()
            .withf(|notice| notice.refund_total == 3000)
            .times(1)
            .returning(|_| Ok(()));

        let ctx = TestContext::with_notifier(Arc::new(notifier)).await;
        let product = stock_product(&ctx, "ITM-001", 1500, 2).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 2)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        ctx.returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 2)])
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_the_return() -> TestResult {
        let mut notifier = MockRefundNotifier::new();

        notifier
            .expect_notify_refund()
            .times(1)
            .returning(|_| Err(NotificationError::Delivery("mail relay offline".to_string())));

        let ctx = TestContext::with_notifier(Arc::new(notifier)).await;
        let product = stock_product(&ctx, "ITM-001", 1500, 2).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 1)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        let receipt = ctx
            .returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 1)])
            .await?;

        assert_eq!(receipt.refund_total, 1500);
        assert_eq!(ctx.returns.list_returns(order.uuid).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn return_records_cannot_be_edited() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stock_product(&ctx, "ITM-001", 1000, 2).await?;
        let order = delivered_order(&ctx, vec![line_for(&product, 1)]).await?;
        let line = order.items.first().map(|item| item.uuid).unwrap_or_default();

        ctx.returns
            .process_return(order.uuid, vec![ReturnLine::new(line, 1)])
            .await?;

        let result = sqlx::query("UPDATE return_records SET reason = 'edited'")
            .execute(ctx.db.pool())
            .await;

        assert!(result.is_err(), "return records must be immutable");

        Ok(())
    }
}
