//! Domain primitives, aggregates, and services.
//!
//! Purpose: define strongly typed storefront entities used by the API and
//! persistence layers, and the services that implement the driving ports.
//! Types validate their invariants on construction; adapters never see raw
//! request input.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Product, Cart, Order, Payment: the storefront aggregates.
//! - AuthService, CartService, ProductService, OrderService, PaymentService:
//!   driving port implementations over the driven repository ports.

pub mod auth;
pub mod auth_service;
pub mod cart;
pub mod cart_service;
pub mod error;
pub mod order;
pub mod order_service;
pub mod payment;
pub mod payment_service;
pub mod ports;
pub mod product;
pub mod product_service;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    AuthSession, AuthValidationError, AuthenticatedUser, HashedPassword, LoginCredentials,
    PASSWORD_MAX, PASSWORD_MIN, RefreshRequest, RefreshTokenFingerprint, RegistrationDetails,
    TokenPair, UserAccount,
};
pub use self::auth_service::AuthService;
pub use self::cart::{
    Cart, CartId, CartItem, CartItemId, CartLine, CartView, GuestCartLine, OwnedCartLine,
    Quantity, QuantityError,
};
pub use self::cart_service::CartService;
pub use self::error::{Error, ErrorCode};
pub use self::order::{
    CheckoutPlan, Order, OrderId, OrderLine, OrderLineId, OrderStatus, UnknownOrderStatus,
};
pub use self::order_service::OrderService;
pub use self::payment::{Payment, PaymentId, PaymentMethod, PaymentStatus, UnknownPaymentValue};
pub use self::payment_service::PaymentService;
pub use self::product::{
    PRODUCT_DESCRIPTION_MAX, PRODUCT_NAME_MAX, Price, Product, ProductDraft, ProductId,
    ProductPatch, ProductValidationError, STOCK_MAX,
};
pub use self::product_service::ProductService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EMAIL_MAX, EmailAddress, PERSON_NAME_MAX, PersonName, User, UserId, UserRole,
    UserValidationError,
};
