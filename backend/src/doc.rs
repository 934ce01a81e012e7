//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint from the inbound layer, the
//! request/response DTOs, the error envelope wrappers ([`ErrorSchema`],
//! [`ErrorCodeSchema`]) and the bearer token security scheme.
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::auth::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse,
};
use crate::inbound::http::cart::{
    AddCartItemBody, CartItemResponse, CartResponse, MergeCartBody, MergeCartItem,
    UpdateCartItemBody,
};
use crate::inbound::http::orders::{OrderItemResponse, OrderResponse};
use crate::inbound::http::payments::{CreatePaymentRequest, PaymentResponse};
use crate::inbound::http::products::{
    CreateProductRequest, ProductResponse, UpdateProductRequest,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the bearer security scheme referenced by protected paths.
pub const BEARER_SCHEME: &str = "bearer";

/// Enrich the generated document with the JWT bearer security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Access token from POST /auth/login. POST /auth/refresh takes the refresh token instead.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        description = "Accounts, catalogue, carts, orders and simulated payments."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("bearer" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::refresh,
        crate::inbound::http::auth::logout,
        crate::inbound::http::cart::get_cart,
        crate::inbound::http::cart::add_item,
        crate::inbound::http::cart::update_item,
        crate::inbound::http::cart::remove_item,
        crate::inbound::http::cart::clear_cart,
        crate::inbound::http::cart::merge_cart,
        crate::inbound::http::products::list_products,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::create_product,
        crate::inbound::http::products::update_product,
        crate::inbound::http::products::deactivate_product,
        crate::inbound::http::orders::checkout,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::orders::cancel_order,
        crate::inbound::http::payments::pay_order,
        crate::inbound::http::payments::list_payments,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterRequest,
        LoginRequest,
        UserResponse,
        AuthResponse,
        MessageResponse,
        AddCartItemBody,
        UpdateCartItemBody,
        MergeCartItem,
        MergeCartBody,
        CartItemResponse,
        CartResponse,
        CreateProductRequest,
        UpdateProductRequest,
        ProductResponse,
        OrderItemResponse,
        OrderResponse,
        CreatePaymentRequest,
        PaymentResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and token rotation"),
        (name = "cart", description = "The caller's open shopping cart"),
        (name = "products", description = "Catalogue browsing and administration"),
        (name = "orders", description = "Checkout and order history"),
        (name = "payments", description = "Simulated payments against orders"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
