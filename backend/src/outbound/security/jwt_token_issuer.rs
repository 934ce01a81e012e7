//! HS256 JSON Web Token implementation of the `TokenIssuer` port.
//!
//! Access and refresh tokens are signed with different secrets and carry a
//! `kind` claim, so neither can stand in for the other. Each token gets a
//! fresh `jti`, which keeps consecutive pairs distinct even within the same
//! second.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::domain::ports::{TokenError, TokenIssuer};
use crate::domain::{AuthenticatedUser, TokenPair, User, UserId, UserRole};

const ACCESS_KIND: &str = "access";
const REFRESH_KIND: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    email: String,
    role: UserRole,
    kind: String,
    jti: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    kind: String,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Secrets and lifetimes for [`JwtTokenIssuer`].
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signs and verifies access/refresh tokens.
pub struct JwtTokenIssuer {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl JwtTokenIssuer {
    /// Build an issuer from `config`.
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            validation,
        }
    }

    fn sign<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|err| TokenError::signing(err.to_string()))
    }

    fn decode<C: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<C, TokenError> {
        decode::<C>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::invalid(err.to_string()),
            })
    }
}

fn check_kind(found: &str, expected: &str) -> Result<(), TokenError> {
    if found == expected {
        Ok(())
    } else {
        Err(TokenError::invalid(format!(
            "expected {expected} token, found {found}"
        )))
    }
}

fn parse_subject(sub: &str) -> Result<UserId, TokenError> {
    UserId::new(sub).map_err(|err| TokenError::invalid(err.to_string()))
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user: &User) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        let sub = user.id.to_string();
        let access = AccessClaims {
            sub: sub.clone(),
            email: user.email.as_ref().to_owned(),
            role: user.role,
            kind: ACCESS_KIND.to_owned(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let refresh = RefreshClaims {
            sub,
            kind: REFRESH_KIND.to_owned(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        Ok(TokenPair {
            access_token: Self::sign(&access, &self.access.encoding)?,
            refresh_token: Self::sign(&refresh, &self.refresh.encoding)?,
        })
    }

    fn verify_access(&self, token: &str) -> Result<AuthenticatedUser, TokenError> {
        let claims: AccessClaims = self.decode(token, &self.access.decoding)?;
        check_kind(&claims.kind, ACCESS_KIND)?;
        Ok(AuthenticatedUser {
            user_id: parse_subject(&claims.sub)?,
            email: claims.email,
            role: claims.role,
        })
    }

    fn verify_refresh(&self, token: &str) -> Result<UserId, TokenError> {
        let claims: RefreshClaims = self.decode(token, &self.refresh.decoding)?;
        check_kind(&claims.kind, REFRESH_KIND)?;
        parse_subject(&claims.sub)
    }
}
