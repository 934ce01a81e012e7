//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Checkout and cancellation each run in one transaction: stock moves, the
//! order row, and the cart rows change together or not at all. Stock is
//! decremented with a guarded `UPDATE ... WHERE stock >= quantity`, so two
//! concurrent checkouts cannot oversell.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{OrderPersistenceError, OrderRepository};
use crate::domain::{
    CheckoutPlan, Order, OrderId, OrderLine, OrderLineId, OrderStatus, Price, ProductId,
    Quantity, UserId,
};

use super::diesel_error_mapping::{map_basic_diesel_error, pool_error_message};
use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};
use super::pool::{DbPool, PoolError};
use super::schema::{cart_items, carts, order_items, orders, products};

/// Diesel-backed implementation of the order repository port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside an order transaction.
enum TxError {
    Diesel(diesel::result::Error),
    Domain(OrderPersistenceError),
}

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl From<TxError> for OrderPersistenceError {
    fn from(value: TxError) -> Self {
        match value {
            TxError::Diesel(error) => map_diesel_error(error),
            TxError::Domain(error) => error,
        }
    }
}

fn map_pool_error(error: PoolError) -> OrderPersistenceError {
    OrderPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> OrderPersistenceError {
    map_basic_diesel_error(
        error,
        OrderPersistenceError::query,
        OrderPersistenceError::connection,
    )
}

fn quantity_for_db(quantity: Quantity) -> Result<i32, OrderPersistenceError> {
    i32::try_from(quantity.get())
        .map_err(|_| OrderPersistenceError::query("quantity exceeds column range"))
}

fn row_to_line(row: OrderItemRow) -> Result<OrderLine, OrderPersistenceError> {
    let quantity = Quantity::new(i64::from(row.quantity))
        .map_err(|err| OrderPersistenceError::query(format!("order item {}: {err}", row.id)))?;
    Ok(OrderLine {
        id: OrderLineId::from_uuid(row.id),
        product_id: ProductId::from_uuid(row.product_id),
        product_name: row.product_name,
        quantity,
        unit_price: Price::from_trusted(row.unit_price),
    })
}

fn row_to_order(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, OrderPersistenceError> {
    let status = row
        .status
        .parse::<OrderStatus>()
        .map_err(|err| OrderPersistenceError::query(err.to_string()))?;
    let lines = items
        .into_iter()
        .map(row_to_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Order {
        id: OrderId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        status,
        total_amount: row.total_amount,
        lines,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Attach item rows to their orders, preserving the order of `rows`.
fn assemble(
    rows: Vec<OrderRow>,
    items: Vec<OrderItemRow>,
) -> Result<Vec<Order>, OrderPersistenceError> {
    let mut grouped: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    rows.into_iter()
        .map(|row| {
            let lines = grouped.remove(&row.id).unwrap_or_default();
            row_to_order(row, lines)
        })
        .collect()
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn checkout(&self, plan: &CheckoutPlan) -> Result<(), OrderPersistenceError> {
        let order = &plan.order;
        let mut stock_moves = Vec::with_capacity(order.lines.len());
        let mut item_rows = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let quantity = quantity_for_db(line.quantity)?;
            stock_moves.push((*line.product_id.as_uuid(), quantity));
            item_rows.push(NewOrderItemRow {
                id: *line.id.as_uuid(),
                order_id: *order.id.as_uuid(),
                product_id: *line.product_id.as_uuid(),
                product_name: line.product_name.as_str(),
                quantity,
                unit_price: line.unit_price.amount(),
            });
        }
        let order_row = NewOrderRow {
            id: *order.id.as_uuid(),
            user_id: *order.user_id.as_uuid(),
            status: order.status.as_str(),
            total_amount: order.total_amount,
            created_at: order.created_at,
            updated_at: order.updated_at,
        };
        let cart_id = *plan.cart_id.as_uuid();
        let consumed: Vec<Uuid> = plan.cart_item_ids.iter().map(|id| *id.as_uuid()).collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let now = Utc::now();
                // Claiming the cart first serialises concurrent checkouts on its row.
                let claimed = diesel::update(
                    carts::table
                        .find(cart_id)
                        .filter(carts::checked_out.eq(false)),
                )
                .set((carts::checked_out.eq(true), carts::updated_at.eq(now)))
                .execute(conn)
                .await?;
                if claimed == 0 {
                    return Err(TxError::Domain(OrderPersistenceError::cart_closed()));
                }
                for (product_id, quantity) in stock_moves {
                    let updated = diesel::update(
                        products::table
                            .find(product_id)
                            .filter(products::stock.ge(quantity)),
                    )
                    .set((
                        products::stock.eq(products::stock - quantity),
                        products::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;
                    if updated == 0 {
                        return Err(TxError::Domain(OrderPersistenceError::insufficient_stock(
                            ProductId::from_uuid(product_id),
                        )));
                    }
                }

                diesel::insert_into(orders::table)
                    .values(&order_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(order_items::table)
                    .values(&item_rows)
                    .execute(conn)
                    .await?;
                diesel::delete(cart_items::table.filter(cart_items::id.eq_any(&consumed)))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(OrderPersistenceError::from)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OrderRow> = orders::table
            .filter(orders::user_id.eq(user_id.as_uuid()))
            .order_by((orders::created_at.desc(), orders::id.asc()))
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let items: Vec<OrderItemRow> = order_items::table
            .filter(order_items::order_id.eq_any(&ids))
            .order_by(order_items::product_name.asc())
            .select(OrderItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        assemble(rows, items)
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = orders::table
            .find(id.as_uuid())
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };
        let items: Vec<OrderItemRow> = order_items::table
            .filter(order_items::order_id.eq(row.id))
            .order_by(order_items::product_name.asc())
            .select(OrderItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_order(row, items).map(Some)
    }

    async fn cancel(&self, order: &Order) -> Result<(), OrderPersistenceError> {
        let order_id = *order.id.as_uuid();
        let restocks = order
            .lines
            .iter()
            .map(|line| Ok((*line.product_id.as_uuid(), quantity_for_db(line.quantity)?)))
            .collect::<Result<Vec<_>, OrderPersistenceError>>()?;

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let now = Utc::now();
                let updated = diesel::update(
                    orders::table
                        .find(order_id)
                        .filter(orders::status.eq(OrderStatus::Pending.as_str())),
                )
                .set((
                    orders::status.eq(OrderStatus::Cancelled.as_str()),
                    orders::updated_at.eq(now),
                ))
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Err(TxError::Domain(OrderPersistenceError::stale_status()));
                }

                for (product_id, quantity) in restocks {
                    diesel::update(products::table.find(product_id))
                        .set((
                            products::stock.eq(products::stock + quantity),
                            products::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(OrderPersistenceError::from)
    }
}
