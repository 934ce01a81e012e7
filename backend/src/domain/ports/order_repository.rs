//! Port abstraction for order persistence.
use async_trait::async_trait;

use crate::domain::{CheckoutPlan, Order, OrderId, ProductId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by order repository adapters.
    pub enum OrderPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "order repository query failed: {message}",
        /// Stock ran out for a product between planning and committing.
        InsufficientStock { product_id: ProductId } => "insufficient stock for product {product_id}",
        /// The order is no longer in the state the caller expected.
        StaleStatus => "order status changed concurrently",
        /// The cart was checked out by another request first.
        CartClosed => "cart was already checked out",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically decrement stock, insert the order, delete the consumed cart
    /// lines, and mark the cart checked out.
    ///
    /// Returns [`OrderPersistenceError::CartClosed`] without changing
    /// anything if the cart is already checked out.
    async fn checkout(&self, plan: &CheckoutPlan) -> Result<(), OrderPersistenceError>;

    /// Orders placed by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderPersistenceError>;

    /// Fetch an order with its lines.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderPersistenceError>;

    /// Atomically mark a pending order cancelled and restore its stock.
    ///
    /// Returns [`OrderPersistenceError::StaleStatus`] if the order is no
    /// longer pending.
    async fn cancel(&self, order: &Order) -> Result<(), OrderPersistenceError>;
}
