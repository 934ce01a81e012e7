//! Driving port for reading the caller's orders.

use async_trait::async_trait;

use crate::domain::{Error, Order, OrderId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQuery: Send + Sync {
    /// Orders placed by the caller, newest first.
    async fn list(&self, user_id: &UserId) -> Result<Vec<Order>, Error>;

    /// Fetch one of the caller's orders.
    ///
    /// # Errors
    /// NotFound when the order is missing or belongs to another user.
    async fn get(&self, user_id: &UserId, order_id: &OrderId) -> Result<Order, Error>;
}
