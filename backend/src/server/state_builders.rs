//! Builders wiring the HTTP state over Diesel or in-memory adapters.

use std::sync::Arc;

use actix_web::web;

use storefront::inbound::http::state::{Adapters, HttpState};
use storefront::outbound::memory::MemoryStore;
use storefront::outbound::persistence::{
    DbPool, DieselCartRepository, DieselOrderRepository, DieselPaymentRepository,
    DieselProductRepository, DieselUserRepository,
};
use storefront::outbound::security::{Argon2PasswordHasher, JwtTokenIssuer};

use super::ServerConfig;

fn diesel_state(
    pool: &DbPool,
    hasher: Arc<Argon2PasswordHasher>,
    tokens: Arc<JwtTokenIssuer>,
) -> HttpState {
    HttpState::from_adapters(Adapters {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        products: Arc::new(DieselProductRepository::new(pool.clone())),
        carts: Arc::new(DieselCartRepository::new(pool.clone())),
        orders: Arc::new(DieselOrderRepository::new(pool.clone())),
        payments: Arc::new(DieselPaymentRepository::new(pool.clone())),
        hasher,
        tokens,
    })
}

fn memory_state(
    store: Arc<MemoryStore>,
    hasher: Arc<Argon2PasswordHasher>,
    tokens: Arc<JwtTokenIssuer>,
) -> HttpState {
    HttpState::from_adapters(Adapters {
        users: Arc::clone(&store),
        products: Arc::clone(&store),
        carts: Arc::clone(&store),
        orders: Arc::clone(&store),
        payments: store,
        hasher,
        tokens,
    })
}

/// Build the shared HTTP state, preferring the database when a pool is set.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let tokens = Arc::new(JwtTokenIssuer::new(&config.jwt));
    let state = match &config.db_pool {
        Some(pool) => diesel_state(pool, hasher, tokens),
        None => memory_state(Arc::new(MemoryStore::new()), hasher, tokens),
    };
    web::Data::new(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rstest::rstest;
    use rust_decimal::Decimal;
    use storefront::RateLimit;
    use storefront::domain::ports::ProductRepository;
    use storefront::domain::{LoginCredentials, ProductDraft, RegistrationDetails};
    use storefront::outbound::security::JwtConfig;

    fn config() -> ServerConfig {
        ServerConfig::new(
            "127.0.0.1:0".parse().expect("socket address"),
            JwtConfig {
                access_secret: "access".to_owned(),
                refresh_secret: "refresh".to_owned(),
                access_ttl: chrono::Duration::minutes(15),
                refresh_ttl: chrono::Duration::days(7),
            },
            RateLimit::new(10, Duration::from_secs(60)).expect("quota"),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn db_pool_absent_wires_the_memory_store() {
        let state = build_http_state(&config());

        assert!(state.products_query.list().await.expect("list").is_empty());

        let details =
            RegistrationDetails::try_from_parts("ada@example.com", "password123", "Ada", "Lovelace")
                .expect("registration shape");
        state.auth.register(details).await.expect("register");

        let credentials = LoginCredentials::try_from_parts("ada@example.com", "password123")
            .expect("credentials shape");
        let session = state.auth.login(credentials).await.expect("login");
        let caller = state
            .tokens
            .verify_access(&session.tokens.access_token)
            .expect("access token verifies");
        assert_eq!(caller.user_id, session.user.id);
    }

    #[rstest]
    #[tokio::test]
    async fn memory_state_shares_one_store_across_ports() {
        let store = Arc::new(MemoryStore::new());
        let cfg = config();
        let state = memory_state(
            Arc::clone(&store),
            Arc::new(Argon2PasswordHasher::new()),
            Arc::new(JwtTokenIssuer::new(&cfg.jwt)),
        );
        let product = ProductDraft::try_from_parts("Mug", None, Decimal::new(1250, 2), 3)
            .expect("draft")
            .into_product(chrono::Utc::now());
        store.insert(&product).await.expect("insert");

        let listed = state.products_query.list().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, product.id);
    }
}
