//! Driving port for placing and cancelling orders.

use async_trait::async_trait;

use crate::domain::{Error, Order, OrderId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderCommand: Send + Sync {
    /// Convert the caller's open cart into a pending order.
    ///
    /// # Errors
    /// InvalidRequest when the cart is empty or a line can no longer be
    /// supplied.
    async fn checkout(&self, user_id: &UserId) -> Result<Order, Error>;

    /// Cancel a pending order owned by the caller, restoring stock.
    async fn cancel(&self, user_id: &UserId, order_id: &OrderId) -> Result<Order, Error>;
}
