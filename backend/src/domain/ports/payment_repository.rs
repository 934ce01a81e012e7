//! Port abstraction for payment persistence.
use async_trait::async_trait;

use crate::domain::{OrderId, Payment};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by payment repository adapters.
    pub enum PaymentPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "payment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "payment repository query failed: {message}",
        /// The order is no longer pending.
        OrderNotPending => "order is not awaiting payment",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert the payment and mark its order paid in one transaction.
    ///
    /// Returns [`PaymentPersistenceError::OrderNotPending`] when the order
    /// was paid or cancelled concurrently.
    async fn record(&self, payment: &Payment) -> Result<(), PaymentPersistenceError>;

    /// Payments recorded against an order, oldest first.
    async fn list_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Payment>, PaymentPersistenceError>;
}
