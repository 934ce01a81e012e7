//! Port abstraction for cart persistence.
//!
//! Each method is a single statement against the store; the cart service
//! composes them without an enclosing transaction.
use async_trait::async_trait;

use crate::domain::{
    Cart, CartId, CartItem, CartItemId, CartLine, OwnedCartLine, ProductId, Quantity, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by cart repository adapters.
    pub enum CartPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "cart repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "cart repository query failed: {message}",
        /// The user already has an open cart.
        OpenCartExists => "user already has an open cart",
        /// The cart already has a line for the product.
        DuplicateLine => "cart already contains the product",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Fetch the user's open cart, if any.
    async fn find_open_cart(&self, user_id: &UserId) -> Result<Option<Cart>, CartPersistenceError>;

    /// Insert a new open cart.
    ///
    /// Returns [`CartPersistenceError::OpenCartExists`] if one already exists.
    async fn insert_cart(&self, cart: &Cart) -> Result<(), CartPersistenceError>;

    /// Load a cart's lines joined with products, oldest first.
    async fn lines(&self, cart_id: &CartId) -> Result<Vec<CartLine>, CartPersistenceError>;

    /// Look up a line together with the owner of its cart.
    async fn find_line(
        &self,
        item_id: &CartItemId,
    ) -> Result<Option<OwnedCartLine>, CartPersistenceError>;

    /// Fetch the cart's line for `product_id`, if any.
    async fn find_item_for_product(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Option<CartItem>, CartPersistenceError>;

    /// Insert a new line.
    async fn insert_item(&self, item: &CartItem) -> Result<(), CartPersistenceError>;

    /// Overwrite a line's quantity.
    async fn set_quantity(
        &self,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> Result<(), CartPersistenceError>;

    /// Delete a single line.
    async fn delete_item(&self, item_id: &CartItemId) -> Result<(), CartPersistenceError>;

    /// Delete every line in the cart.
    async fn clear(&self, cart_id: &CartId) -> Result<(), CartPersistenceError>;
}
