//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories implement the domain's driven ports over a `bb8` pool of
//! `diesel-async` connections.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Business rules stay in the domain services.
//! - **Internal models**: `models.rs` and `schema.rs` never leave this module.
//! - **Typed errors**: Diesel and pool failures map to each port's
//!   persistence error; unique-constraint violations the services care about
//!   get their own variants.
//!
//! # Example
//!
//! ```no_run
//! use storefront::outbound::persistence::{DbPool, DieselCartRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/storefront")).await?;
//! let carts = DieselCartRepository::new(pool);
//! # let _ = carts;
//! # Ok(())
//! # }
//! ```

mod diesel_cart_repository;
mod diesel_error_mapping;
mod diesel_order_repository;
mod diesel_payment_repository;
mod diesel_product_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_cart_repository::DieselCartRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_product_repository::DieselProductRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
