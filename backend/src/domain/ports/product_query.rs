//! Driving port for reading the public catalogue.

use async_trait::async_trait;

use crate::domain::{Error, Product, ProductId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductQuery: Send + Sync {
    /// List products that can currently be bought.
    async fn list(&self) -> Result<Vec<Product>, Error>;

    /// Fetch an active product.
    ///
    /// # Errors
    /// NotFound when the product is missing or inactive.
    async fn get(&self, id: &ProductId) -> Result<Product, Error>;
}
