//! PostgreSQL-backed `PaymentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{PaymentPersistenceError, PaymentRepository};
use crate::domain::{
    OrderId, OrderStatus, Payment, PaymentId, PaymentMethod, PaymentStatus,
};

use super::diesel_error_mapping::{
    map_basic_diesel_error, pool_error_message, violated_unique_constraint,
};
use super::models::{NewPaymentRow, PaymentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{orders, payments};

const COMPLETED_PAYMENT_INDEX: &str = "payments_one_completed_per_order";

/// Diesel-backed implementation of the payment repository port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

enum TxError {
    Diesel(diesel::result::Error),
    NotPending,
}

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

fn map_pool_error(error: PoolError) -> PaymentPersistenceError {
    PaymentPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> PaymentPersistenceError {
    match violated_unique_constraint(&error) {
        Some(COMPLETED_PAYMENT_INDEX) => PaymentPersistenceError::order_not_pending(),
        _ => map_basic_diesel_error(
            error,
            PaymentPersistenceError::query,
            PaymentPersistenceError::connection,
        ),
    }
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, PaymentPersistenceError> {
    let method = row
        .method
        .parse::<PaymentMethod>()
        .map_err(|err| PaymentPersistenceError::query(err.to_string()))?;
    let status = row
        .status
        .parse::<PaymentStatus>()
        .map_err(|err| PaymentPersistenceError::query(err.to_string()))?;
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        order_id: OrderId::from_uuid(row.order_id),
        amount: row.amount,
        method,
        status,
        provider_reference: row.provider_reference,
        created_at: row.created_at,
    })
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn record(&self, payment: &Payment) -> Result<(), PaymentPersistenceError> {
        let order_id = *payment.order_id.as_uuid();
        let row = NewPaymentRow {
            id: *payment.id.as_uuid(),
            order_id,
            amount: payment.amount,
            method: payment.method.as_str(),
            status: payment.status.as_str(),
            provider_reference: payment.provider_reference.as_str(),
            created_at: payment.created_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let updated = diesel::update(
                    orders::table
                        .find(order_id)
                        .filter(orders::status.eq(OrderStatus::Pending.as_str())),
                )
                .set((
                    orders::status.eq(OrderStatus::Paid.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Err(TxError::NotPending);
                }
                diesel::insert_into(payments::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| match err {
            TxError::Diesel(error) => map_diesel_error(error),
            TxError::NotPending => PaymentPersistenceError::order_not_pending(),
        })
    }

    async fn list_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Payment>, PaymentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::order_id.eq(order_id.as_uuid()))
            .order_by(payments::created_at.asc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_payment).collect()
    }
}
