//! Checkout and order lifecycle.
//!
//! Checkout snapshots the open cart into a pending order, capturing each
//! product's current price. The stock decrement, order insert, and cart
//! close happen atomically inside [`OrderRepository::checkout`]; the checks
//! here only produce friendlier errors for the common case.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    CartPersistenceError, CartRepository, OrderCommand, OrderPersistenceError, OrderQuery,
    OrderRepository,
};
use crate::domain::{
    CartLine, CheckoutPlan, Error, Order, OrderId, OrderLine, OrderLineId, OrderStatus, UserId,
};

/// Order service implementing [`OrderCommand`] and [`OrderQuery`].
#[derive(Clone)]
pub struct OrderService<O, C> {
    orders: Arc<O>,
    carts: Arc<C>,
}

impl<O, C> OrderService<O, C> {
    /// Create a new service with the given repositories.
    pub fn new(orders: Arc<O>, carts: Arc<C>) -> Self {
        Self { orders, carts }
    }
}

fn cart_is_empty() -> Error {
    Error::invalid_request("Cart is empty")
}

fn order_not_found() -> Error {
    Error::not_found("Order not found")
}

fn order_line_for(line: &CartLine) -> Result<OrderLine, Error> {
    let product = &line.product;
    if !product.is_active {
        return Err(Error::invalid_request(format!(
            "Product {} is no longer available",
            product.name
        ))
        .with_details(json!({ "code": "product_unavailable", "productId": product.id })));
    }
    if !product.has_stock_for(line.item.quantity.get()) {
        return Err(Error::invalid_request(format!(
            "Insufficient stock for {}. Available: {}",
            product.name, product.stock
        ))
        .with_details(json!({
            "code": "insufficient_stock",
            "productId": product.id,
            "available": product.stock,
        })));
    }
    Ok(OrderLine {
        id: OrderLineId::random(),
        product_id: product.id,
        product_name: product.name.clone(),
        quantity: line.item.quantity,
        unit_price: product.price,
    })
}

impl<O, C> OrderService<O, C>
where
    O: OrderRepository,
    C: CartRepository,
{
    fn map_order_error(error: OrderPersistenceError) -> Error {
        match error {
            OrderPersistenceError::InsufficientStock { product_id } => {
                Error::invalid_request("Insufficient stock to complete checkout").with_details(
                    json!({ "code": "insufficient_stock", "productId": product_id }),
                )
            }
            OrderPersistenceError::StaleStatus => {
                Error::invalid_request("Order status changed; reload and retry")
            }
            OrderPersistenceError::CartClosed => Error::conflict("Cart was already checked out"),
            other => Error::internal(format!("order repository error: {other}")),
        }
    }

    fn map_cart_error(error: CartPersistenceError) -> Error {
        Error::internal(format!("cart repository error: {error}"))
    }

    async fn owned_order(&self, user_id: &UserId, order_id: &OrderId) -> Result<Order, Error> {
        self.orders
            .find_by_id(order_id)
            .await
            .map_err(Self::map_order_error)?
            .filter(|order| order.user_id == *user_id)
            .ok_or_else(order_not_found)
    }
}

#[async_trait]
impl<O, C> OrderCommand for OrderService<O, C>
where
    O: OrderRepository,
    C: CartRepository,
{
    async fn checkout(&self, user_id: &UserId) -> Result<Order, Error> {
        let cart = self
            .carts
            .find_open_cart(user_id)
            .await
            .map_err(Self::map_cart_error)?
            .ok_or_else(cart_is_empty)?;
        let lines = self
            .carts
            .lines(&cart.id)
            .await
            .map_err(Self::map_cart_error)?;
        if lines.is_empty() {
            return Err(cart_is_empty());
        }

        let order_lines = lines
            .iter()
            .map(order_line_for)
            .collect::<Result<Vec<_>, _>>()?;
        let total_amount = order_lines
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.subtotal()?))
            .ok_or_else(|| Error::invalid_request("Order total exceeds the supported range"))?;
        let now = Utc::now();
        let plan = CheckoutPlan {
            cart_id: cart.id,
            cart_item_ids: lines.iter().map(|line| line.item.id).collect(),
            order: Order {
                id: OrderId::random(),
                user_id: *user_id,
                status: OrderStatus::Pending,
                total_amount,
                lines: order_lines,
                created_at: now,
                updated_at: now,
            },
        };

        self.orders
            .checkout(&plan)
            .await
            .map_err(Self::map_order_error)?;
        info!(
            order_id = %plan.order.id,
            user_id = %user_id,
            total = %plan.order.total_amount,
            "order placed"
        );
        Ok(plan.order)
    }

    async fn cancel(&self, user_id: &UserId, order_id: &OrderId) -> Result<Order, Error> {
        let mut order = self.owned_order(user_id, order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(Error::invalid_request(format!(
                "Only pending orders can be cancelled; order is {}",
                order.status
            )));
        }

        self.orders
            .cancel(&order)
            .await
            .map_err(Self::map_order_error)?;
        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }
}

#[async_trait]
impl<O, C> OrderQuery for OrderService<O, C>
where
    O: OrderRepository,
    C: CartRepository,
{
    async fn list(&self, user_id: &UserId) -> Result<Vec<Order>, Error> {
        self.orders
            .list_for_user(user_id)
            .await
            .map_err(Self::map_order_error)
    }

    async fn get(&self, user_id: &UserId, order_id: &OrderId) -> Result<Order, Error> {
        self.owned_order(user_id, order_id).await
    }
}

#[cfg(test)]
#[path = "order_service_tests.rs"]
mod tests;
