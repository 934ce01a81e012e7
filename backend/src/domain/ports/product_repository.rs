//! Port abstraction for catalogue persistence.
use async_trait::async_trait;

use crate::domain::{Product, ProductId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by product repository adapters.
    pub enum ProductPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "product repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "product repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fetch a product regardless of its active flag.
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ProductPersistenceError>;

    /// List active products ordered by name.
    async fn list_active(&self) -> Result<Vec<Product>, ProductPersistenceError>;

    /// Insert a new product.
    async fn insert(&self, product: &Product) -> Result<(), ProductPersistenceError>;

    /// Overwrite an existing product. Returns `false` when no row matched.
    async fn update(&self, product: &Product) -> Result<bool, ProductPersistenceError>;
}
