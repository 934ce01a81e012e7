//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::web;
use chrono::{TimeZone, Utc};

use crate::domain::ports::{
    MockAuthCommand, MockCartCommand, MockCartQuery, MockOrderCommand, MockOrderQuery,
    MockPaymentCommand, MockPaymentQuery, MockProductCommand, MockProductQuery, MockTokenIssuer,
};
use crate::domain::{
    AuthenticatedUser, EmailAddress, PersonName, Price, Product, ProductId, User, UserId,
    UserRole,
};
use crate::inbound::http::state::HttpState;

/// Mock ports for one handler test; unset expectations fail loudly.
#[derive(Default)]
pub(crate) struct MockPorts {
    pub auth: MockAuthCommand,
    pub cart: MockCartCommand,
    pub cart_query: MockCartQuery,
    pub products: MockProductCommand,
    pub products_query: MockProductQuery,
    pub orders: MockOrderCommand,
    pub orders_query: MockOrderQuery,
    pub payments: MockPaymentCommand,
    pub payments_query: MockPaymentQuery,
    pub tokens: MockTokenIssuer,
}

impl MockPorts {
    /// Accept any access token as `caller`.
    pub fn signed_in_as(mut self, caller: AuthenticatedUser) -> Self {
        self.tokens
            .expect_verify_access()
            .returning(move |_| Ok(caller.clone()));
        self
    }

    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            auth: Arc::new(self.auth),
            cart: Arc::new(self.cart),
            cart_query: Arc::new(self.cart_query),
            products: Arc::new(self.products),
            products_query: Arc::new(self.products_query),
            orders: Arc::new(self.orders),
            orders_query: Arc::new(self.orders_query),
            payments: Arc::new(self.payments),
            payments_query: Arc::new(self.payments_query),
            tokens: Arc::new(self.tokens),
        })
    }
}

pub(crate) fn state_with_tokens(tokens: MockTokenIssuer) -> HttpState {
    let state = MockPorts {
        tokens,
        ..MockPorts::default()
    }
    .into_state();
    HttpState::clone(&state)
}

pub(crate) fn caller(role: UserRole) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: UserId::random(),
        email: "ada@example.com".to_owned(),
        role,
    }
}

pub(crate) fn user_for(caller: &AuthenticatedUser) -> User {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
    User {
        id: caller.user_id,
        email: EmailAddress::new(&caller.email).expect("valid email"),
        first_name: PersonName::from_trusted("Ada".to_owned()),
        last_name: PersonName::from_trusted("Lovelace".to_owned()),
        role: caller.role,
        created_at: at,
        updated_at: at,
    }
}

pub(crate) fn product(name: &str, price: &str, stock: u32) -> Product {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
    Product {
        id: ProductId::random(),
        name: name.to_owned(),
        description: None,
        price: Price::from_trusted(price.parse().expect("decimal literal")),
        stock,
        is_active: true,
        created_at: at,
        updated_at: at,
    }
}

pub(crate) const BEARER: (&str, &str) = ("Authorization", "Bearer token");
