//! Refund notifications.
//!
//! The return processor hands a [`RefundNotice`] to a [`RefundNotifier`] once the return is
//! committed. Composing and sending the actual message happens elsewhere.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::domain::orders::records::OrderUuid;

/// Order and amount refunded by one return transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundNotice {
    pub order_uuid: OrderUuid,
    pub refund_total: u64,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The collaborator could not accept the notice.
    #[error("refund notice could not be delivered: {0}")]
    Delivery(String),
}

#[automock]
#[async_trait]
pub trait RefundNotifier: Send + Sync {
    /// Hand over a refund notice for an already committed return.
    async fn notify_refund(&self, notice: RefundNotice) -> Result<(), NotificationError>;
}

/// Notifier that records notices as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRefundNotifier;

#[async_trait]
impl RefundNotifier for LogRefundNotifier {
    async fn notify_refund(&self, notice: RefundNotice) -> Result<(), NotificationError> {
        info!(
            target: "notifications",
            order_uuid = %notice.order_uuid,
            refund_total = notice.refund_total,
            "refund notice issued"
        );

        Ok(())
    }
}
