//! Test utilities for the storefront crate.
//!
//! Integration tests (in `tests/`) build the full application over the
//! in-memory store through [`TestApp`]. Compiled only with the
//! `test-support` feature.

use std::sync::Arc;

use argon2::Params;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::ports::{PasswordHasher as _, ProductRepository, UserRepository};
use crate::domain::{
    EmailAddress, PersonName, Product, ProductDraft, User, UserAccount, UserId, UserRole,
};
use crate::inbound::http::state::{Adapters, HttpState};
use crate::outbound::memory::MemoryStore;
use crate::outbound::security::{Argon2PasswordHasher, JwtConfig, JwtTokenIssuer};

/// Access-token secret used by test wiring.
pub const TEST_ACCESS_SECRET: &str = "test-access-secret";
/// Refresh-token secret used by test wiring.
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret";

/// Token configuration with fixed secrets and default lifetimes.
pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: TEST_ACCESS_SECRET.to_owned(),
        refresh_secret: TEST_REFRESH_SECRET.to_owned(),
        access_ttl: chrono::Duration::minutes(15),
        refresh_ttl: chrono::Duration::days(7),
    }
}

/// Argon2id with the smallest work factor so tests stay fast.
pub fn fast_hasher() -> Argon2PasswordHasher {
    match Params::new(Params::MIN_M_COST, 1, 1, None) {
        Ok(params) => Argon2PasswordHasher::with_params(params),
        Err(_) => Argon2PasswordHasher::new(),
    }
}

/// In-memory application wiring with direct access to the backing store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: HttpState,
    hasher: Arc<Argon2PasswordHasher>,
}

impl TestApp {
    /// Fresh store and services.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let hasher = Arc::new(fast_hasher());
        let state = HttpState::from_adapters(Adapters {
            users: Arc::clone(&store),
            products: Arc::clone(&store),
            carts: Arc::clone(&store),
            orders: Arc::clone(&store),
            payments: Arc::clone(&store),
            hasher: Arc::clone(&hasher),
            tokens: Arc::new(JwtTokenIssuer::new(&test_jwt_config())),
        });
        Self {
            store,
            state,
            hasher,
        }
    }

    /// Insert an active product directly into the catalogue.
    ///
    /// # Panics
    ///
    /// Panics when the draft is invalid or the store rejects it.
    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i64) -> Product {
        let product = ProductDraft::try_from_parts(name, None, price, stock)
            .expect("valid product draft")
            .into_product(Utc::now());
        ProductRepository::insert(self.store.as_ref(), &product)
            .await
            .expect("product insert");
        product
    }

    /// Insert an account with the admin role; sign in through `/auth/login`.
    ///
    /// # Panics
    ///
    /// Panics when hashing or the insert fails.
    pub async fn seed_admin(&self, email: &str, password: &str) -> UserId {
        let now = Utc::now();
        let user = User {
            id: UserId::random(),
            email: EmailAddress::new(email).expect("valid admin email"),
            first_name: PersonName::from_trusted("Store".to_owned()),
            last_name: PersonName::from_trusted("Admin".to_owned()),
            role: UserRole::Admin,
            created_at: now,
            updated_at: now,
        };
        let id = user.id;
        let account = UserAccount {
            user,
            password_hash: self.hasher.hash(password).expect("hash admin password"),
            refresh_token: None,
        };
        UserRepository::insert(self.store.as_ref(), &account)
            .await
            .expect("admin insert");
        id
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
