//! Catalogue reads and admin-only catalogue mutations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::domain::ports::{
    ProductCommand, ProductPersistenceError, ProductQuery, ProductRepository,
};
use crate::domain::{
    AuthenticatedUser, Error, Product, ProductDraft, ProductId, ProductPatch,
};

/// Product service implementing [`ProductQuery`] and [`ProductCommand`].
#[derive(Clone)]
pub struct ProductService<R> {
    products: Arc<R>,
}

impl<R> ProductService<R> {
    /// Create a new service over the product repository.
    pub fn new(products: Arc<R>) -> Self {
        Self { products }
    }
}

fn product_not_found() -> Error {
    Error::not_found("Product not found")
}

fn require_admin(actor: &AuthenticatedUser) -> Result<(), Error> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("Admin role required"))
    }
}

impl<R> ProductService<R>
where
    R: ProductRepository,
{
    fn map_error(error: ProductPersistenceError) -> Error {
        Error::internal(format!("product repository error: {error}"))
    }

    async fn load_any(&self, id: &ProductId) -> Result<Product, Error> {
        self.products
            .find_by_id(id)
            .await
            .map_err(Self::map_error)?
            .ok_or_else(product_not_found)
    }

    async fn store(&self, product: &Product) -> Result<(), Error> {
        let updated = self
            .products
            .update(product)
            .await
            .map_err(Self::map_error)?;
        if updated {
            Ok(())
        } else {
            Err(product_not_found())
        }
    }
}

#[async_trait]
impl<R> ProductQuery for ProductService<R>
where
    R: ProductRepository,
{
    async fn list(&self) -> Result<Vec<Product>, Error> {
        self.products.list_active().await.map_err(Self::map_error)
    }

    async fn get(&self, id: &ProductId) -> Result<Product, Error> {
        let product = self.load_any(id).await?;
        if product.is_active {
            Ok(product)
        } else {
            Err(product_not_found())
        }
    }
}

#[async_trait]
impl<R> ProductCommand for ProductService<R>
where
    R: ProductRepository,
{
    async fn create(
        &self,
        actor: &AuthenticatedUser,
        draft: ProductDraft,
    ) -> Result<Product, Error> {
        require_admin(actor)?;
        let product = draft.into_product(Utc::now());
        self.products
            .insert(&product)
            .await
            .map_err(Self::map_error)?;
        info!(product_id = %product.id, actor = %actor.user_id, "product created");
        Ok(product)
    }

    async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, Error> {
        require_admin(actor)?;
        let mut product = self.load_any(id).await?;
        if patch.is_empty() {
            return Ok(product);
        }
        patch.apply(&mut product, Utc::now());
        self.store(&product).await?;
        Ok(product)
    }

    async fn deactivate(
        &self,
        actor: &AuthenticatedUser,
        id: &ProductId,
    ) -> Result<Product, Error> {
        require_admin(actor)?;
        let mut product = self.load_any(id).await?;
        if product.is_active {
            product.is_active = false;
            product.updated_at = Utc::now();
            self.store(&product).await?;
            info!(product_id = %product.id, actor = %actor.user_id, "product deactivated");
        }
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockProductRepository;
    use crate::domain::{ErrorCode, UserId, UserRole};
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    fn actor(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::random(),
            email: "staff@example.com".to_owned(),
            role,
        }
    }

    #[fixture]
    fn mug() -> Product {
        ProductDraft::try_from_parts("Mug", None, Decimal::new(500, 2), 4)
            .expect("valid draft")
            .into_product(Utc::now())
    }

    #[rstest]
    #[tokio::test]
    async fn get_hides_inactive_products(mut mug: Product) {
        mug.is_active = false;
        let id = mug.id;
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id()
            .return_once(move |_| Ok(Some(mug)));

        let service = ProductService::new(Arc::new(repo));
        let error = service.get(&id).await.expect_err("inactive");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn customers_cannot_create_products() {
        let mut repo = MockProductRepository::new();
        repo.expect_insert().times(0);

        let service = ProductService::new(Arc::new(repo));
        let draft = ProductDraft::try_from_parts("Mug", None, Decimal::ONE, 1).expect("draft");
        let error = service
            .create(&actor(UserRole::Customer), draft)
            .await
            .expect_err("forbidden");

        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn admins_create_active_products() {
        let mut repo = MockProductRepository::new();
        repo.expect_insert()
            .withf(|product: &Product| product.is_active && product.stock == 7)
            .times(1)
            .return_once(|_| Ok(()));

        let service = ProductService::new(Arc::new(repo));
        let draft = ProductDraft::try_from_parts("Kettle", Some("Steel"), Decimal::TEN, 7)
            .expect("draft");
        let product = service
            .create(&actor(UserRole::Admin), draft)
            .await
            .expect("created");

        assert_eq!(product.name, "Kettle");
    }

    #[rstest]
    #[tokio::test]
    async fn update_applies_patch_and_persists(mug: Product) {
        let id = mug.id;
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id()
            .return_once(move |_| Ok(Some(mug)));
        repo.expect_update()
            .withf(|product: &Product| product.stock == 12)
            .times(1)
            .return_once(|_| Ok(true));

        let service = ProductService::new(Arc::new(repo));
        let patch =
            ProductPatch::try_from_parts(None, None, None, Some(12), None).expect("valid patch");
        let product = service
            .update(&actor(UserRole::Admin), &id, patch)
            .await
            .expect("updated");

        assert_eq!(product.stock, 12);
    }

    #[rstest]
    #[tokio::test]
    async fn deactivate_clears_active_flag(mug: Product) {
        let id = mug.id;
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id()
            .return_once(move |_| Ok(Some(mug)));
        repo.expect_update()
            .withf(|product: &Product| !product.is_active)
            .times(1)
            .return_once(|_| Ok(true));

        let service = ProductService::new(Arc::new(repo));
        let product = service
            .deactivate(&actor(UserRole::Admin), &id)
            .await
            .expect("deactivated");

        assert!(!product.is_active);
    }
}
