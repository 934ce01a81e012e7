//! PostgreSQL-backed `CartRepository` implementation using Diesel ORM.
//!
//! Every method issues a single statement. The partial unique index
//! `carts_one_open_per_user` and the `cart_items_cart_id_product_id_key`
//! constraint turn racing inserts into typed errors the cart service can
//! recover from.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{CartPersistenceError, CartRepository};
use crate::domain::{
    Cart, CartId, CartItem, CartItemId, CartLine, OwnedCartLine, ProductId, Quantity, UserId,
};

use super::diesel_error_mapping::{
    map_basic_diesel_error, pool_error_message, violated_unique_constraint,
};
use super::diesel_product_repository::row_to_product;
use super::models::{CartItemRow, CartRow, ProductRow};
use super::pool::{DbPool, PoolError};
use super::schema::{cart_items, carts, products};

const OPEN_CART_INDEX: &str = "carts_one_open_per_user";
const CART_LINE_CONSTRAINT: &str = "cart_items_cart_id_product_id_key";

/// Diesel-backed implementation of the cart repository port.
#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CartPersistenceError {
    CartPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> CartPersistenceError {
    match violated_unique_constraint(&error) {
        Some(OPEN_CART_INDEX) => CartPersistenceError::open_cart_exists(),
        Some(CART_LINE_CONSTRAINT) => CartPersistenceError::duplicate_line(),
        _ => map_basic_diesel_error(
            error,
            CartPersistenceError::query,
            CartPersistenceError::connection,
        ),
    }
}

fn row_to_cart(row: CartRow) -> Cart {
    Cart {
        id: CartId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        checked_out: row.checked_out,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_item(row: CartItemRow) -> Result<CartItem, CartPersistenceError> {
    let quantity = Quantity::new(i64::from(row.quantity))
        .map_err(|err| CartPersistenceError::query(format!("cart item {}: {err}", row.id)))?;
    Ok(CartItem {
        id: CartItemId::from_uuid(row.id),
        cart_id: CartId::from_uuid(row.cart_id),
        product_id: ProductId::from_uuid(row.product_id),
        quantity,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rows_to_line(item: CartItemRow, product: ProductRow) -> Result<CartLine, CartPersistenceError> {
    Ok(CartLine {
        item: row_to_item(item)?,
        product: row_to_product(product).map_err(CartPersistenceError::query)?,
    })
}

fn quantity_for_db(quantity: Quantity) -> Result<i32, CartPersistenceError> {
    i32::try_from(quantity.get())
        .map_err(|_| CartPersistenceError::query("quantity exceeds column range"))
}

fn item_row(item: &CartItem) -> Result<CartItemRow, CartPersistenceError> {
    Ok(CartItemRow {
        id: *item.id.as_uuid(),
        cart_id: *item.cart_id.as_uuid(),
        product_id: *item.product_id.as_uuid(),
        quantity: quantity_for_db(item.quantity)?,
        created_at: item.created_at,
        updated_at: item.updated_at,
    })
}

#[async_trait]
impl CartRepository for DieselCartRepository {
    async fn find_open_cart(&self, user_id: &UserId) -> Result<Option<Cart>, CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CartRow> = carts::table
            .filter(carts::user_id.eq(user_id.as_uuid()))
            .filter(carts::checked_out.eq(false))
            .select(CartRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_cart))
    }

    async fn insert_cart(&self, cart: &Cart) -> Result<(), CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = CartRow {
            id: *cart.id.as_uuid(),
            user_id: *cart.user_id.as_uuid(),
            checked_out: cart.checked_out,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        };
        diesel::insert_into(carts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn lines(&self, cart_id: &CartId) -> Result<Vec<CartLine>, CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(CartItemRow, ProductRow)> = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::cart_id.eq(cart_id.as_uuid()))
            .order_by((cart_items::created_at.asc(), cart_items::id.asc()))
            .select((CartItemRow::as_select(), ProductRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(item, product)| rows_to_line(item, product))
            .collect()
    }

    async fn find_line(
        &self,
        item_id: &CartItemId,
    ) -> Result<Option<OwnedCartLine>, CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(CartItemRow, ProductRow, Uuid)> = cart_items::table
            .inner_join(carts::table)
            .inner_join(products::table)
            .filter(cart_items::id.eq(item_id.as_uuid()))
            .select((
                CartItemRow::as_select(),
                ProductRow::as_select(),
                carts::user_id,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(item, product, owner)| {
            Ok(OwnedCartLine {
                owner_id: UserId::from_uuid(owner),
                line: rows_to_line(item, product)?,
            })
        })
        .transpose()
    }

    async fn find_item_for_product(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Option<CartItem>, CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CartItemRow> = cart_items::table
            .filter(cart_items::cart_id.eq(cart_id.as_uuid()))
            .filter(cart_items::product_id.eq(product_id.as_uuid()))
            .select(CartItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_item).transpose()
    }

    async fn insert_item(&self, item: &CartItem) -> Result<(), CartPersistenceError> {
        let row = item_row(item)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(cart_items::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn set_quantity(
        &self,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> Result<(), CartPersistenceError> {
        let quantity = quantity_for_db(quantity)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(cart_items::table.find(item_id.as_uuid()))
            .set((
                cart_items::quantity.eq(quantity),
                cart_items::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_item(&self, item_id: &CartItemId) -> Result<(), CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(cart_items::table.find(item_id.as_uuid()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn clear(&self, cart_id: &CartId) -> Result<(), CartPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id.as_uuid())))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
