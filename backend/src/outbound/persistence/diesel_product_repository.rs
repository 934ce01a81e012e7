//! PostgreSQL-backed `ProductRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ProductPersistenceError, ProductRepository};
use crate::domain::{Price, Product, ProductId};

use super::diesel_error_mapping::{map_basic_diesel_error, pool_error_message};
use super::models::{ProductRecord, ProductRow};
use super::pool::{DbPool, PoolError};
use super::schema::products;

/// Diesel-backed implementation of the product repository port.
#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProductPersistenceError {
    ProductPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> ProductPersistenceError {
    map_basic_diesel_error(
        error,
        ProductPersistenceError::query,
        ProductPersistenceError::connection,
    )
}

/// Convert a stored row; shared with the cart and order adapters.
pub(super) fn row_to_product(row: ProductRow) -> Result<Product, String> {
    let stock = u32::try_from(row.stock).map_err(|_| format!("negative stock on {}", row.id))?;
    Ok(Product {
        id: ProductId::from_uuid(row.id),
        name: row.name,
        description: row.description,
        price: Price::from_trusted(row.price),
        stock,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Stock as stored; the domain caps stock at `i32::MAX`.
pub(super) fn stock_for_db(stock: u32) -> Result<i32, String> {
    i32::try_from(stock).map_err(|_| format!("stock {stock} exceeds column range"))
}

fn record_for(product: &Product) -> Result<ProductRecord<'_>, ProductPersistenceError> {
    Ok(ProductRecord {
        id: *product.id.as_uuid(),
        name: product.name.as_str(),
        description: product.description.as_deref(),
        price: product.price.amount(),
        stock: stock_for_db(product.stock).map_err(ProductPersistenceError::query)?,
        is_active: product.is_active,
        created_at: product.created_at,
        updated_at: product.updated_at,
    })
}

#[async_trait]
impl ProductRepository for DieselProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProductRow> = products::table
            .find(id.as_uuid())
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_product)
            .transpose()
            .map_err(ProductPersistenceError::query)
    }

    async fn list_active(&self) -> Result<Vec<Product>, ProductPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProductRow> = products::table
            .filter(products::is_active.eq(true))
            .order_by((products::name.asc(), products::id.asc()))
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(row_to_product)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ProductPersistenceError::query)
    }

    async fn insert(&self, product: &Product) -> Result<(), ProductPersistenceError> {
        let record = record_for(product)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(products::table)
            .values(&record)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, product: &Product) -> Result<bool, ProductPersistenceError> {
        let record = record_for(product)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(products::table.find(product.id.as_uuid()))
            .set(&record)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }
}
