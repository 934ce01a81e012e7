//! Port for issuing and verifying signed bearer tokens.

use crate::domain::{AuthenticatedUser, TokenPair, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Failures raised by token adapters.
    pub enum TokenError {
        /// The token's expiry has passed.
        Expired => "token expired",
        /// The token is malformed, has a bad signature, or carries bad claims.
        Invalid { message: String } => "token invalid: {message}",
        /// Signing a new token failed.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// Issues access/refresh token pairs and verifies presented tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    /// Issue a fresh pair for `user`. Consecutive calls never return the same
    /// refresh token.
    fn issue(&self, user: &User) -> Result<TokenPair, TokenError>;

    /// Verify an access token and return the caller identity.
    fn verify_access(&self, token: &str) -> Result<AuthenticatedUser, TokenError>;

    /// Verify a refresh token and return its subject.
    fn verify_refresh(&self, token: &str) -> Result<UserId, TokenError>;
}
