//! Driving port for account and session operations.
//!
//! HTTP handlers call [`AuthCommand`] once a request body or bearer token has
//! been validated; implementations own hashing, token issuance, and refresh
//! token rotation.

use async_trait::async_trait;

use crate::domain::{AuthSession, Error, LoginCredentials, RefreshRequest, RegistrationDetails, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthCommand: Send + Sync {
    /// Create an account and open a session.
    ///
    /// # Errors
    /// Conflict when the email is already registered.
    async fn register(&self, details: RegistrationDetails) -> Result<AuthSession, Error>;

    /// Open a session for existing credentials.
    ///
    /// # Errors
    /// Unauthorized for an unknown email or a wrong password.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;

    /// Rotate the token pair for a verified refresh token.
    ///
    /// # Errors
    /// Unauthorized when the user is gone or the token was revoked.
    async fn refresh(&self, request: RefreshRequest) -> Result<AuthSession, Error>;

    /// Revoke the user's refresh token.
    async fn logout(&self, user_id: &UserId) -> Result<(), Error>;
}
