//! Domain ports for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`) are implemented by domain services and
//! consumed by inbound adapters. Driven ports (`*Repository`,
//! [`PasswordHasher`], [`TokenIssuer`]) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_command;
mod cart_command;
mod cart_query;
mod cart_repository;
mod order_command;
mod order_query;
mod order_repository;
mod password_hasher;
mod payment_command;
mod payment_repository;
mod product_command;
mod product_query;
mod product_repository;
mod token_issuer;
mod user_repository;

pub use auth_command::AuthCommand;
#[cfg(test)]
pub use auth_command::MockAuthCommand;
pub use cart_command::{AddCartItemRequest, CartCommand, UpdateCartItemRequest};
#[cfg(test)]
pub use cart_command::MockCartCommand;
pub use cart_query::CartQuery;
#[cfg(test)]
pub use cart_query::MockCartQuery;
pub use cart_repository::{CartPersistenceError, CartRepository};
#[cfg(test)]
pub use cart_repository::MockCartRepository;
pub use order_command::OrderCommand;
#[cfg(test)]
pub use order_command::MockOrderCommand;
pub use order_query::OrderQuery;
#[cfg(test)]
pub use order_query::MockOrderQuery;
pub use order_repository::{OrderPersistenceError, OrderRepository};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use payment_command::{PaymentCommand, PaymentQuery};
#[cfg(test)]
pub use payment_command::{MockPaymentCommand, MockPaymentQuery};
pub use payment_repository::{PaymentPersistenceError, PaymentRepository};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use product_command::ProductCommand;
#[cfg(test)]
pub use product_command::MockProductCommand;
pub use product_query::ProductQuery;
#[cfg(test)]
pub use product_query::MockProductQuery;
pub use product_repository::{ProductPersistenceError, ProductRepository};
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use token_issuer::{TokenError, TokenIssuer};
#[cfg(test)]
pub use token_issuer::MockTokenIssuer;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
