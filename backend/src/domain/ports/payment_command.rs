//! Driving ports for paying orders and listing their payments.

use async_trait::async_trait;

use crate::domain::{Error, OrderId, Payment, PaymentMethod, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCommand: Send + Sync {
    /// Settle a pending order owned by the caller.
    ///
    /// # Errors
    /// - NotFound when the order is missing or belongs to another user.
    /// - Conflict when the order is already paid.
    /// - InvalidRequest when the order was cancelled.
    async fn pay(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<Payment, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentQuery: Send + Sync {
    /// Payments for one of the caller's orders.
    async fn list(&self, user_id: &UserId, order_id: &OrderId) -> Result<Vec<Payment>, Error>;
}
