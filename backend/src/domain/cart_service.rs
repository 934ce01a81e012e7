//! Cart domain service.
//!
//! Implements [`CartQuery`] and [`CartCommand`] over the cart and product
//! repositories. Stock is validated against the product row on every
//! mutation but never reserved. Operations run as sequences of independent
//! repository calls; concurrent requests for the same user may interleave.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{
    AddCartItemRequest, CartCommand, CartPersistenceError, CartQuery, CartRepository,
    ProductPersistenceError, ProductRepository, UpdateCartItemRequest,
};
use crate::domain::{
    Cart, CartItem, CartItemId, CartView, Error, GuestCartLine, OwnedCartLine, Product, ProductId,
    Quantity, UserId,
};

/// Cart service implementing the cart driving ports.
#[derive(Clone)]
pub struct CartService<C, P> {
    carts: Arc<C>,
    products: Arc<P>,
}

impl<C, P> CartService<C, P> {
    /// Create a new service with the given repositories.
    pub fn new(carts: Arc<C>, products: Arc<P>) -> Self {
        Self { carts, products }
    }
}

fn insufficient_stock(product: &Product) -> Error {
    Error::invalid_request(format!("Insufficient stock. Available: {}", product.stock)).with_details(
        json!({
            "code": "insufficient_stock",
            "productId": product.id,
            "available": product.stock,
        }),
    )
}

fn insufficient_stock_with_existing(product: &Product, existing: Quantity) -> Error {
    Error::invalid_request(format!(
        "Insufficient stock. Available: {}, Current in cart: {}",
        product.stock,
        existing.get()
    ))
    .with_details(json!({
        "code": "insufficient_stock",
        "productId": product.id,
        "available": product.stock,
        "inCart": existing.get(),
    }))
}

fn cart_item_not_found() -> Error {
    Error::not_found("Cart item not found")
}

impl<C, P> CartService<C, P>
where
    C: CartRepository,
    P: ProductRepository,
{
    fn map_cart_error(error: CartPersistenceError) -> Error {
        match error {
            CartPersistenceError::DuplicateLine => {
                Error::conflict("Cart was modified concurrently; retry the request")
            }
            other => Error::internal(format!("cart repository error: {other}")),
        }
    }

    fn map_product_error(error: ProductPersistenceError) -> Error {
        Error::internal(format!("product repository error: {error}"))
    }

    async fn load_product(&self, id: &ProductId) -> Result<Product, Error> {
        self.products
            .find_by_id(id)
            .await
            .map_err(Self::map_product_error)?
            .ok_or_else(|| Error::not_found("Product not found"))
    }

    async fn open_cart(&self, user_id: &UserId) -> Result<Cart, Error> {
        if let Some(cart) = self
            .carts
            .find_open_cart(user_id)
            .await
            .map_err(Self::map_cart_error)?
        {
            return Ok(cart);
        }

        let cart = Cart::open_for(*user_id, Utc::now());
        match self.carts.insert_cart(&cart).await {
            Ok(()) => Ok(cart),
            // Another request created the cart first; use theirs.
            Err(CartPersistenceError::OpenCartExists) => self
                .carts
                .find_open_cart(user_id)
                .await
                .map_err(Self::map_cart_error)?
                .ok_or_else(|| Error::internal("open cart vanished after conflicting insert")),
            Err(err) => Err(Self::map_cart_error(err)),
        }
    }

    async fn view(&self, cart: Cart) -> Result<CartView, Error> {
        let lines = self
            .carts
            .lines(&cart.id)
            .await
            .map_err(Self::map_cart_error)?;
        Ok(CartView { cart, lines })
    }

    async fn owned_line(
        &self,
        user_id: &UserId,
        item_id: &CartItemId,
    ) -> Result<OwnedCartLine, Error> {
        self.carts
            .find_line(item_id)
            .await
            .map_err(Self::map_cart_error)?
            .filter(|owned| owned.owner_id == *user_id)
            .ok_or_else(cart_item_not_found)
    }

    async fn add_line(
        &self,
        cart: &Cart,
        product: &Product,
        quantity: Quantity,
    ) -> Result<(), Error> {
        let existing = self
            .carts
            .find_item_for_product(&cart.id, &product.id)
            .await
            .map_err(Self::map_cart_error)?;

        match existing {
            Some(item) => {
                let total = item
                    .quantity
                    .checked_add(quantity)
                    .filter(|total| product.has_stock_for(total.get()))
                    .ok_or_else(|| insufficient_stock_with_existing(product, item.quantity))?;
                self.carts
                    .set_quantity(&item.id, total)
                    .await
                    .map_err(Self::map_cart_error)
            }
            None => {
                let now = Utc::now();
                let item = CartItem {
                    id: CartItemId::random(),
                    cart_id: cart.id,
                    product_id: product.id,
                    quantity,
                    created_at: now,
                    updated_at: now,
                };
                self.carts
                    .insert_item(&item)
                    .await
                    .map_err(Self::map_cart_error)
            }
        }
    }

    async fn merge_line(&self, user_id: &UserId, line: &GuestCartLine) -> Result<(), Error> {
        let product_id = Uuid::parse_str(line.product_id.trim())
            .map(ProductId::from_uuid)
            .map_err(|_| Error::invalid_request("productId must be a valid UUID"))?;
        let raw = line
            .quantity
            .as_i64()
            .ok_or_else(|| Error::invalid_request("quantity must be an integer"))?;
        let quantity =
            Quantity::new(raw).map_err(|err| Error::invalid_request(err.to_string()))?;
        self.add_item(AddCartItemRequest {
            user_id: *user_id,
            product_id,
            quantity,
        })
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl<C, P> CartQuery for CartService<C, P>
where
    C: CartRepository,
    P: ProductRepository,
{
    async fn get_or_create(&self, user_id: &UserId) -> Result<CartView, Error> {
        let cart = self.open_cart(user_id).await?;
        self.view(cart).await
    }
}

#[async_trait]
impl<C, P> CartCommand for CartService<C, P>
where
    C: CartRepository,
    P: ProductRepository,
{
    async fn add_item(&self, request: AddCartItemRequest) -> Result<CartView, Error> {
        let AddCartItemRequest {
            user_id,
            product_id,
            quantity,
        } = request;

        let product = self.load_product(&product_id).await?;
        if !product.is_active {
            return Err(Error::invalid_request("Product is not available"));
        }
        if !product.has_stock_for(quantity.get()) {
            return Err(insufficient_stock(&product));
        }

        let cart = self.open_cart(&user_id).await?;
        self.add_line(&cart, &product, quantity).await?;
        self.view(cart).await
    }

    async fn update_item(&self, request: UpdateCartItemRequest) -> Result<CartView, Error> {
        let UpdateCartItemRequest {
            user_id,
            item_id,
            quantity,
        } = request;

        let owned = self.owned_line(&user_id, &item_id).await?;
        if !owned.line.product.has_stock_for(quantity.get()) {
            return Err(insufficient_stock(&owned.line.product));
        }
        self.carts
            .set_quantity(&item_id, quantity)
            .await
            .map_err(Self::map_cart_error)?;

        self.get_or_create(&user_id).await
    }

    async fn remove_item(
        &self,
        user_id: &UserId,
        item_id: &CartItemId,
    ) -> Result<CartView, Error> {
        self.owned_line(user_id, item_id).await?;
        self.carts
            .delete_item(item_id)
            .await
            .map_err(Self::map_cart_error)?;

        self.get_or_create(user_id).await
    }

    async fn clear(&self, user_id: &UserId) -> Result<CartView, Error> {
        if let Some(cart) = self
            .carts
            .find_open_cart(user_id)
            .await
            .map_err(Self::map_cart_error)?
        {
            self.carts
                .clear(&cart.id)
                .await
                .map_err(Self::map_cart_error)?;
        }

        self.get_or_create(user_id).await
    }

    async fn merge(&self, user_id: &UserId, lines: Vec<GuestCartLine>) -> Result<CartView, Error> {
        for line in &lines {
            if let Err(error) = self.merge_line(user_id, line).await {
                warn!(
                    user_id = %user_id,
                    product_id = %line.product_id,
                    quantity = %line.quantity,
                    code = ?error.code(),
                    error = %error,
                    "skipping guest cart line during merge"
                );
            }
        }

        self.get_or_create(user_id).await
    }
}

#[cfg(test)]
#[path = "cart_service_tests.rs"]
mod tests;
