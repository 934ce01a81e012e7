//! Driving port for catalogue administration.

use async_trait::async_trait;

use crate::domain::{AuthenticatedUser, Error, Product, ProductDraft, ProductId, ProductPatch};

/// Catalogue mutations. Every operation requires the admin role.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCommand: Send + Sync {
    /// Create an active product.
    async fn create(&self, actor: &AuthenticatedUser, draft: ProductDraft)
    -> Result<Product, Error>;

    /// Apply a partial update.
    async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, Error>;

    /// Soft-delete by clearing the active flag.
    async fn deactivate(&self, actor: &AuthenticatedUser, id: &ProductId)
    -> Result<Product, Error>;
}
