//! Driving port for cart mutations.
//!
//! Every operation returns the refreshed [`CartView`] so adapters can respond
//! with the full cart and its totals.

use async_trait::async_trait;

use crate::domain::{CartItemId, CartView, Error, GuestCartLine, ProductId, Quantity, UserId};

/// Request to add units of a product to the caller's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCartItemRequest {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Request to overwrite a cart line's quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCartItemRequest {
    pub user_id: UserId,
    pub item_id: CartItemId,
    pub quantity: Quantity,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartCommand: Send + Sync {
    /// Add units, summing with an existing line for the same product.
    ///
    /// # Errors
    /// - NotFound when the product does not exist.
    /// - InvalidRequest when the product is inactive or stock is insufficient.
    async fn add_item(&self, request: AddCartItemRequest) -> Result<CartView, Error>;

    /// Overwrite a line's quantity.
    ///
    /// # Errors
    /// - NotFound when the line is missing or belongs to another user.
    /// - InvalidRequest when stock is insufficient.
    async fn update_item(&self, request: UpdateCartItemRequest) -> Result<CartView, Error>;

    /// Delete a line owned by the caller.
    async fn remove_item(&self, user_id: &UserId, item_id: &CartItemId)
    -> Result<CartView, Error>;

    /// Delete every line of the open cart.
    async fn clear(&self, user_id: &UserId) -> Result<CartView, Error>;

    /// Add each guest line in turn, skipping lines that fail.
    async fn merge(&self, user_id: &UserId, lines: Vec<GuestCartLine>)
    -> Result<CartView, Error>;
}
