//! In-memory implementation of every repository port.
//!
//! Used when no database URL is configured and by behaviour tests. One
//! [`MemoryStore`] backs all five repositories so checkout can touch stock,
//! orders, and carts under a single lock, mirroring the database
//! transaction. It enforces the same uniqueness rules as the PostgreSQL
//! schema (email, one open cart per user, one line per product).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    CartPersistenceError, CartRepository, OrderPersistenceError, OrderRepository,
    PaymentPersistenceError, PaymentRepository, ProductPersistenceError, ProductRepository,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    Cart, CartId, CartItem, CartItemId, CartLine, CheckoutPlan, EmailAddress, Order, OrderId,
    OrderStatus, OwnedCartLine, Payment, Product, ProductId, Quantity, RefreshTokenFingerprint,
    UserAccount, UserId,
};

const POISONED: &str = "in-memory store lock poisoned";

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserAccount>,
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, Cart>,
    /// Insertion order doubles as creation order.
    items: Vec<CartItem>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
}

impl State {
    fn line_for(&self, item: &CartItem) -> Option<CartLine> {
        self.products.get(&item.product_id).map(|product| CartLine {
            item: item.clone(),
            product: product.clone(),
        })
    }

    fn item_mut(&mut self, item_id: &CartItemId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.id == *item_id)
    }

    fn order_mut(&mut self, order_id: &OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|order| order.id == *order_id)
    }
}

/// Shared in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<E>(&self, poisoned: impl FnOnce(&'static str) -> E) -> Result<MutexGuard<'_, State>, E> {
        self.state.lock().map_err(|_| poisoned(POISONED))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut state = self.lock(UserPersistenceError::query)?;
        if state
            .users
            .values()
            .any(|existing| existing.user.email == account.user.email)
        {
            return Err(UserPersistenceError::duplicate_email());
        }
        state.users.insert(account.user.id, account.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = self.lock(UserPersistenceError::query)?;
        Ok(state
            .users
            .values()
            .find(|account| account.user.email == *email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = self.lock(UserPersistenceError::query)?;
        Ok(state.users.get(id).cloned())
    }

    async fn set_refresh_token(
        &self,
        id: &UserId,
        fingerprint: Option<RefreshTokenFingerprint>,
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.lock(UserPersistenceError::query)?;
        if let Some(account) = state.users.get_mut(id) {
            account.refresh_token = fingerprint;
            account.user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ProductPersistenceError> {
        let state = self.lock(ProductPersistenceError::query)?;
        Ok(state.products.get(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Product>, ProductPersistenceError> {
        let state = self.lock(ProductPersistenceError::query)?;
        let mut active: Vec<Product> = state
            .products
            .values()
            .filter(|product| product.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(active)
    }

    async fn insert(&self, product: &Product) -> Result<(), ProductPersistenceError> {
        let mut state = self.lock(ProductPersistenceError::query)?;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, ProductPersistenceError> {
        let mut state = self.lock(ProductPersistenceError::query)?;
        Ok(state
            .products
            .get_mut(&product.id)
            .map(|stored| *stored = product.clone())
            .is_some())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_open_cart(&self, user_id: &UserId) -> Result<Option<Cart>, CartPersistenceError> {
        let state = self.lock(CartPersistenceError::query)?;
        Ok(state
            .carts
            .values()
            .find(|cart| cart.user_id == *user_id && !cart.checked_out)
            .cloned())
    }

    async fn insert_cart(&self, cart: &Cart) -> Result<(), CartPersistenceError> {
        let mut state = self.lock(CartPersistenceError::query)?;
        let open_exists = state
            .carts
            .values()
            .any(|existing| existing.user_id == cart.user_id && !existing.checked_out);
        if open_exists && !cart.checked_out {
            return Err(CartPersistenceError::open_cart_exists());
        }
        state.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn lines(&self, cart_id: &CartId) -> Result<Vec<CartLine>, CartPersistenceError> {
        let state = self.lock(CartPersistenceError::query)?;
        state
            .items
            .iter()
            .filter(|item| item.cart_id == *cart_id)
            .map(|item| {
                state
                    .line_for(item)
                    .ok_or_else(|| CartPersistenceError::query("cart item references missing product"))
            })
            .collect()
    }

    async fn find_line(
        &self,
        item_id: &CartItemId,
    ) -> Result<Option<OwnedCartLine>, CartPersistenceError> {
        let state = self.lock(CartPersistenceError::query)?;
        let Some(item) = state.items.iter().find(|item| item.id == *item_id) else {
            return Ok(None);
        };
        let owner_id = state
            .carts
            .get(&item.cart_id)
            .map(|cart| cart.user_id)
            .ok_or_else(|| CartPersistenceError::query("cart item references missing cart"))?;
        let line = state
            .line_for(item)
            .ok_or_else(|| CartPersistenceError::query("cart item references missing product"))?;
        Ok(Some(OwnedCartLine { owner_id, line }))
    }

    async fn find_item_for_product(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Option<CartItem>, CartPersistenceError> {
        let state = self.lock(CartPersistenceError::query)?;
        Ok(state
            .items
            .iter()
            .find(|item| item.cart_id == *cart_id && item.product_id == *product_id)
            .cloned())
    }

    async fn insert_item(&self, item: &CartItem) -> Result<(), CartPersistenceError> {
        let mut state = self.lock(CartPersistenceError::query)?;
        if state
            .items
            .iter()
            .any(|existing| existing.cart_id == item.cart_id && existing.product_id == item.product_id)
        {
            return Err(CartPersistenceError::duplicate_line());
        }
        state.items.push(item.clone());
        Ok(())
    }

    async fn set_quantity(
        &self,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> Result<(), CartPersistenceError> {
        let mut state = self.lock(CartPersistenceError::query)?;
        if let Some(item) = state.item_mut(item_id) {
            item.quantity = quantity;
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_item(&self, item_id: &CartItemId) -> Result<(), CartPersistenceError> {
        let mut state = self.lock(CartPersistenceError::query)?;
        state.items.retain(|item| item.id != *item_id);
        Ok(())
    }

    async fn clear(&self, cart_id: &CartId) -> Result<(), CartPersistenceError> {
        let mut state = self.lock(CartPersistenceError::query)?;
        state.items.retain(|item| item.cart_id != *cart_id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn checkout(&self, plan: &CheckoutPlan) -> Result<(), OrderPersistenceError> {
        let mut state = self.lock(OrderPersistenceError::query)?;

        let open = state
            .carts
            .get(&plan.cart_id)
            .is_some_and(|cart| !cart.checked_out);
        if !open {
            return Err(OrderPersistenceError::cart_closed());
        }

        let mut wanted: HashMap<ProductId, u64> = HashMap::new();
        for line in &plan.order.lines {
            *wanted.entry(line.product_id).or_default() += u64::from(line.quantity.get());
        }
        // Validate every stock move before applying any of them.
        for (product_id, quantity) in &wanted {
            let available = state
                .products
                .get(product_id)
                .map_or(0, |product| u64::from(product.stock));
            if available < *quantity {
                return Err(OrderPersistenceError::insufficient_stock(*product_id));
            }
        }

        let now = Utc::now();
        for (product_id, quantity) in wanted {
            if let Some(product) = state.products.get_mut(&product_id) {
                let remaining = u64::from(product.stock) - quantity;
                product.stock = u32::try_from(remaining).unwrap_or(product.stock);
                product.updated_at = now;
            }
        }
        state
            .items
            .retain(|item| !plan.cart_item_ids.contains(&item.id));
        if let Some(cart) = state.carts.get_mut(&plan.cart_id) {
            cart.checked_out = true;
            cart.updated_at = now;
        }
        state.orders.push(plan.order.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderPersistenceError> {
        let state = self.lock(OrderPersistenceError::query)?;
        // Newest first; later pushes win ties on equal timestamps.
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|order| order.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderPersistenceError> {
        let state = self.lock(OrderPersistenceError::query)?;
        Ok(state.orders.iter().find(|order| order.id == *id).cloned())
    }

    async fn cancel(&self, order: &Order) -> Result<(), OrderPersistenceError> {
        let mut state = self.lock(OrderPersistenceError::query)?;
        let now = Utc::now();
        let stored = state
            .order_mut(&order.id)
            .filter(|stored| stored.status == OrderStatus::Pending)
            .ok_or_else(OrderPersistenceError::stale_status)?;
        stored.status = OrderStatus::Cancelled;
        stored.updated_at = now;
        let restocks: Vec<(ProductId, u32)> = stored
            .lines
            .iter()
            .map(|line| (line.product_id, line.quantity.get()))
            .collect();

        for (product_id, quantity) in restocks {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.stock = product.stock.saturating_add(quantity);
                product.updated_at = now;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn record(&self, payment: &Payment) -> Result<(), PaymentPersistenceError> {
        let mut state = self.lock(PaymentPersistenceError::query)?;
        let order = state
            .order_mut(&payment.order_id)
            .filter(|order| order.status == OrderStatus::Pending)
            .ok_or_else(PaymentPersistenceError::order_not_pending)?;
        order.status = OrderStatus::Paid;
        order.updated_at = Utc::now();
        state.payments.push(payment.clone());
        Ok(())
    }

    async fn list_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Payment>, PaymentPersistenceError> {
        let state = self.lock(PaymentPersistenceError::query)?;
        Ok(state
            .payments
            .iter()
            .filter(|payment| payment.order_id == *order_id)
            .cloned()
            .collect())
    }
}
