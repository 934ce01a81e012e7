//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AuthCommand, CartCommand, CartQuery, OrderCommand, OrderQuery, OrderRepository,
    PasswordHasher, PaymentCommand, PaymentQuery, PaymentRepository, ProductCommand,
    ProductQuery, ProductRepository, TokenIssuer, CartRepository, UserRepository,
};
use crate::domain::{AuthService, CartService, OrderService, PaymentService, ProductService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthCommand>,
    pub cart: Arc<dyn CartCommand>,
    pub cart_query: Arc<dyn CartQuery>,
    pub products: Arc<dyn ProductCommand>,
    pub products_query: Arc<dyn ProductQuery>,
    pub orders: Arc<dyn OrderCommand>,
    pub orders_query: Arc<dyn OrderQuery>,
    pub payments: Arc<dyn PaymentCommand>,
    pub payments_query: Arc<dyn PaymentQuery>,
    /// Verifies bearer tokens in the request extractors.
    pub tokens: Arc<dyn TokenIssuer>,
}

/// Driven adapters the domain services are built over.
pub struct Adapters<U, P, C, O, Pay, H, T> {
    pub users: Arc<U>,
    pub products: Arc<P>,
    pub carts: Arc<C>,
    pub orders: Arc<O>,
    pub payments: Arc<Pay>,
    pub hasher: Arc<H>,
    pub tokens: Arc<T>,
}

impl HttpState {
    /// Wire every domain service over the given adapters.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use storefront::inbound::http::state::{Adapters, HttpState};
    /// use storefront::outbound::memory::MemoryStore;
    /// use storefront::outbound::security::{Argon2PasswordHasher, JwtConfig, JwtTokenIssuer};
    ///
    /// let store = Arc::new(MemoryStore::new());
    /// let tokens = JwtTokenIssuer::new(&JwtConfig {
    ///     access_secret: "access".into(),
    ///     refresh_secret: "refresh".into(),
    ///     access_ttl: chrono::Duration::minutes(15),
    ///     refresh_ttl: chrono::Duration::days(7),
    /// });
    /// let state = HttpState::from_adapters(Adapters {
    ///     users: Arc::clone(&store),
    ///     products: Arc::clone(&store),
    ///     carts: Arc::clone(&store),
    ///     orders: Arc::clone(&store),
    ///     payments: store,
    ///     hasher: Arc::new(Argon2PasswordHasher::new()),
    ///     tokens: Arc::new(tokens),
    /// });
    /// let _cart = state.cart_query.clone();
    /// ```
    pub fn from_adapters<U, P, C, O, Pay, H, T>(adapters: Adapters<U, P, C, O, Pay, H, T>) -> Self
    where
        U: UserRepository + 'static,
        P: ProductRepository + 'static,
        C: CartRepository + 'static,
        O: OrderRepository + 'static,
        Pay: PaymentRepository + 'static,
        H: PasswordHasher + 'static,
        T: TokenIssuer + 'static,
    {
        let Adapters {
            users,
            products,
            carts,
            orders,
            payments,
            hasher,
            tokens,
        } = adapters;

        let auth = Arc::new(AuthService::new(users, hasher, Arc::clone(&tokens)));
        let cart = Arc::new(CartService::new(Arc::clone(&carts), Arc::clone(&products)));
        let catalogue = Arc::new(ProductService::new(products));
        let ordering = Arc::new(OrderService::new(Arc::clone(&orders), carts));
        let paying = Arc::new(PaymentService::new(payments, orders));

        Self {
            auth,
            cart: cart.clone(),
            cart_query: cart,
            products: catalogue.clone(),
            products_query: catalogue,
            orders: ordering.clone(),
            orders_query: ordering,
            payments: paying.clone(),
            payments_query: paying,
            tokens,
        }
    }
}
