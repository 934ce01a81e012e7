//! Account registration, login, and session rotation.
//!
//! Password hashing is CPU bound, so it runs on Tokio's blocking pool. Only a
//! SHA-256 fingerprint of the current refresh token is stored; presenting any
//! other refresh token, or any token after logout, is rejected.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AuthCommand, PasswordHashError, PasswordHasher, TokenError, TokenIssuer, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    AuthSession, Error, ErrorCode, HashedPassword, LoginCredentials, RefreshRequest,
    RefreshTokenFingerprint, RegistrationDetails, User, UserAccount, UserId, UserRole,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const REGISTRATION_FAILED: &str = "An error occurred during registration";

/// Auth service implementing [`AuthCommand`].
#[derive(Clone)]
pub struct AuthService<U, H, T> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
}

impl<U, H, T> AuthService<U, H, T> {
    /// Create a new service from its driven ports.
    pub fn new(users: Arc<U>, hasher: Arc<H>, tokens: Arc<T>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }
}

impl<U, H, T> AuthService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher + 'static,
    T: TokenIssuer,
{
    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::DuplicateEmail => {
                Error::conflict("User with this email already exists")
            }
            other => Error::internal(format!("user repository error: {other}")),
        }
    }

    fn map_hash_error(error: PasswordHashError) -> Error {
        Error::internal(error.to_string())
    }

    fn map_token_error(error: TokenError) -> Error {
        Error::internal(error.to_string())
    }

    async fn hash_password(&self, password: &str) -> Result<HashedPassword, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || hasher.hash(password.as_str()))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(Self::map_hash_error)
    }

    async fn verify_password(&self, password: &str, hash: HashedPassword) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || hasher.verify(password.as_str(), &hash))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))?
            .map_err(Self::map_hash_error)
    }

    /// Issue a pair for `user` and make its refresh token the only valid one.
    async fn open_session(&self, user: User) -> Result<AuthSession, Error> {
        let tokens = self.tokens.issue(&user).map_err(Self::map_token_error)?;
        self.users
            .set_refresh_token(&user.id, Some(RefreshTokenFingerprint::of(&tokens.refresh_token)))
            .await
            .map_err(Self::map_user_error)?;
        Ok(AuthSession { tokens, user })
    }

    async fn create_account(&self, details: RegistrationDetails) -> Result<AuthSession, Error> {
        let existing = self
            .users
            .find_by_email(details.email())
            .await
            .map_err(Self::map_user_error)?;
        if existing.is_some() {
            return Err(Error::conflict("User with this email already exists"));
        }

        let password_hash = self.hash_password(details.password()).await?;
        let now = Utc::now();
        let user = User {
            id: UserId::random(),
            email: details.email().clone(),
            first_name: details.first_name().clone(),
            last_name: details.last_name().clone(),
            role: UserRole::Customer,
            created_at: now,
            updated_at: now,
        };
        let tokens = self.tokens.issue(&user).map_err(Self::map_token_error)?;
        let account = UserAccount {
            user: user.clone(),
            password_hash,
            refresh_token: Some(RefreshTokenFingerprint::of(&tokens.refresh_token)),
        };
        self.users
            .insert(&account)
            .await
            .map_err(Self::map_user_error)?;

        info!(user_id = %user.id, "user registered");
        Ok(AuthSession { tokens, user })
    }
}

#[async_trait]
impl<U, H, T> AuthCommand for AuthService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher + 'static,
    T: TokenIssuer,
{
    async fn register(&self, details: RegistrationDetails) -> Result<AuthSession, Error> {
        match self.create_account(details).await {
            Err(err) if err.code() == ErrorCode::InternalError => {
                error!(error = %err, "registration failed");
                Err(Error::internal(REGISTRATION_FAILED))
            }
            result => result,
        }
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        let Some(account) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(Self::map_user_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let matches = self
            .verify_password(credentials.password(), account.password_hash)
            .await?;
        if !matches {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        self.open_session(account.user).await
    }

    async fn refresh(&self, request: RefreshRequest) -> Result<AuthSession, Error> {
        let Some(account) = self
            .users
            .find_by_id(&request.user_id)
            .await
            .map_err(Self::map_user_error)?
        else {
            return Err(Error::unauthorized("User not found"));
        };

        let presented = RefreshTokenFingerprint::of(request.token.as_str());
        if account.refresh_token.as_ref() != Some(&presented) {
            warn!(user_id = %request.user_id, "rejected revoked refresh token");
            return Err(Error::unauthorized("Refresh token revoked"));
        }

        self.open_session(account.user).await
    }

    async fn logout(&self, user_id: &UserId) -> Result<(), Error> {
        self.users
            .set_refresh_token(user_id, None)
            .await
            .map_err(Self::map_user_error)
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
