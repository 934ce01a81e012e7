//! Authentication primitives: credentials, token pairs, and token subjects.
//!
//! Inbound adapters build these values from raw request fields; services and
//! ports only ever see validated data. Secrets are wrapped in [`Zeroizing`] so
//! they are wiped when dropped.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::{EmailAddress, PersonName, User, UserId, UserRole, UserValidationError};

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length.
pub const PASSWORD_MAX: usize = 128;

/// Validation failures for registration and login payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// A user field failed validation.
    User(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password length is outside the accepted range.
    PasswordLength { min: usize, max: usize },
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordLength { min, max } => {
                write!(f, "password must be between {min} and {max} characters")
            }
        }
    }
}

impl std::error::Error for AuthValidationError {}

impl From<UserValidationError> for AuthValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::User(value)
    }
}

/// Validated sign-up payload.
///
/// # Examples
/// ```
/// use storefront::domain::RegistrationDetails;
///
/// let details =
///     RegistrationDetails::try_from_parts("Ada@Example.com", "hunter2hunter2", "Ada", "Lovelace")
///         .unwrap();
/// assert_eq!(details.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDetails {
    email: EmailAddress,
    password: Zeroizing<String>,
    first_name: PersonName,
    last_name: PersonName,
}

impl RegistrationDetails {
    /// Validate raw registration inputs.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email)?;
        let length = password.chars().count();
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length) {
            return Err(AuthValidationError::PasswordLength {
                min: PASSWORD_MIN,
                max: PASSWORD_MAX,
            });
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
            first_name: PersonName::new(first_name, "firstName")?,
            last_name: PersonName::new(last_name, "lastName")?,
        })
    }

    /// Normalised email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plain-text password supplied by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Given name.
    pub fn first_name(&self) -> &PersonName {
        &self.first_name
    }

    /// Family name.
    pub fn last_name(&self) -> &PersonName {
        &self.last_name
    }
}

/// Validated login credentials.
///
/// The password keeps caller-provided whitespace so comparisons are exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Encoded password hash as produced by a [`crate::domain::ports::PasswordHasher`].
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap an encoded hash string.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// PHC-formatted hash string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

/// Stored user record including credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub user: User,
    pub password_hash: HashedPassword,
    /// Fingerprint of the currently valid refresh token, if any.
    pub refresh_token: Option<RefreshTokenFingerprint>,
}

/// SHA-256 fingerprint of a refresh token.
///
/// Only the fingerprint is persisted, so a leaked database row cannot be
/// replayed as a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenFingerprint(String);

impl RefreshTokenFingerprint {
    /// Fingerprint a raw refresh token.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::RefreshTokenFingerprint;
    ///
    /// let a = RefreshTokenFingerprint::of("token");
    /// assert_eq!(a, RefreshTokenFingerprint::of("token"));
    /// assert_eq!(a.as_str().len(), 64);
    /// ```
    pub fn of(token: &str) -> Self {
        Self(hex::encode(Sha256::digest(token.as_bytes())))
    }

    /// Rehydrate a fingerprint loaded from storage.
    pub fn from_stored(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    /// Hex-encoded digest.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Signed access/refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair(..)")
    }
}

/// Result of a successful register, login, or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub user: User,
}

/// Identity carried by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Whether the caller may administer the catalogue.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

/// Verified refresh token presented to `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub user_id: UserId,
    pub token: Zeroizing<String>,
}
