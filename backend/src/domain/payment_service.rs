//! Simulated payment capture for pending orders.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::domain::ports::{
    OrderPersistenceError, OrderRepository, PaymentCommand, PaymentPersistenceError,
    PaymentQuery, PaymentRepository,
};
use crate::domain::{
    Error, Order, OrderId, OrderStatus, Payment, PaymentId, PaymentMethod, PaymentStatus, UserId,
};

/// Payment service implementing [`PaymentCommand`] and [`PaymentQuery`].
#[derive(Clone)]
pub struct PaymentService<P, O> {
    payments: Arc<P>,
    orders: Arc<O>,
}

impl<P, O> PaymentService<P, O> {
    /// Create a new service with the given repositories.
    pub fn new(payments: Arc<P>, orders: Arc<O>) -> Self {
        Self { payments, orders }
    }
}

/// Reference in the shape a card processor would return.
fn simulated_provider_reference() -> String {
    format!("sim_{}", hex::encode(rand::random::<[u8; 12]>()))
}

impl<P, O> PaymentService<P, O>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    fn map_payment_error(error: PaymentPersistenceError) -> Error {
        match error {
            PaymentPersistenceError::OrderNotPending => {
                Error::conflict("Order is no longer awaiting payment")
            }
            other => Error::internal(format!("payment repository error: {other}")),
        }
    }

    fn map_order_error(error: OrderPersistenceError) -> Error {
        Error::internal(format!("order repository error: {error}"))
    }

    async fn owned_order(&self, user_id: &UserId, order_id: &OrderId) -> Result<Order, Error> {
        self.orders
            .find_by_id(order_id)
            .await
            .map_err(Self::map_order_error)?
            .filter(|order| order.user_id == *user_id)
            .ok_or_else(|| Error::not_found("Order not found"))
    }
}

#[async_trait]
impl<P, O> PaymentCommand for PaymentService<P, O>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    async fn pay(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<Payment, Error> {
        let order = self.owned_order(user_id, order_id).await?;
        match order.status {
            OrderStatus::Pending => {}
            OrderStatus::Paid => return Err(Error::conflict("Order has already been paid")),
            OrderStatus::Cancelled => {
                return Err(Error::invalid_request("Cannot pay for a cancelled order"));
            }
        }

        let payment = Payment {
            id: PaymentId::random(),
            order_id: order.id,
            amount: order.total_amount,
            method,
            status: PaymentStatus::Completed,
            provider_reference: simulated_provider_reference(),
            created_at: Utc::now(),
        };
        self.payments
            .record(&payment)
            .await
            .map_err(Self::map_payment_error)?;

        info!(order_id = %order.id, payment_id = %payment.id, method = %method, "order paid");
        Ok(payment)
    }
}

#[async_trait]
impl<P, O> PaymentQuery for PaymentService<P, O>
where
    P: PaymentRepository,
    O: OrderRepository,
{
    async fn list(&self, user_id: &UserId, order_id: &OrderId) -> Result<Vec<Payment>, Error> {
        let order = self.owned_order(user_id, order_id).await?;
        self.payments
            .list_for_order(&order.id)
            .await
            .map_err(Self::map_payment_error)
    }
}
