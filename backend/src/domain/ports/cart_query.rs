//! Driving port for reading the caller's cart.

use async_trait::async_trait;

use crate::domain::{CartView, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartQuery: Send + Sync {
    /// Return the user's open cart, creating an empty one on first access.
    ///
    /// Repeated calls return the same cart until it is checked out.
    async fn get_or_create(&self, user_id: &UserId) -> Result<CartView, Error>;
}
