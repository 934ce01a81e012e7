//! Bearer-token extractors.
//!
//! Handlers declare the credential they need by taking [`AccessBearer`] or
//! [`RefreshBearer`]; the extractor verifies the `Authorization` header
//! through the [`TokenIssuer`](crate::domain::ports::TokenIssuer) held in
//! [`HttpState`] before the handler body runs.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::TokenError;
use crate::domain::{AuthenticatedUser, Error, RefreshRequest};
use crate::inbound::http::state::HttpState;

const SCHEME: &str = "Bearer ";

/// Caller identity proven by a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessBearer(pub AuthenticatedUser);

impl AccessBearer {
    /// Require the admin role.
    pub fn require_admin(&self) -> Result<&AuthenticatedUser, Error> {
        if self.0.is_admin() {
            Ok(&self.0)
        } else {
            Err(Error::forbidden("Admin access required"))
        }
    }
}

/// A refresh token whose signature, expiry and kind were verified.
#[derive(Debug, Clone)]
pub struct RefreshBearer(pub RefreshRequest);

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(SCHEME))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("Missing bearer token"))
}

fn state(req: &HttpRequest) -> Result<&web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))
}

fn map_token_error(err: TokenError) -> Error {
    debug!(error = %err, "bearer token rejected");
    match err {
        TokenError::Expired => Error::unauthorized("Token expired"),
        TokenError::Invalid { .. } | TokenError::Signing { .. } => {
            Error::unauthorized("Invalid token")
        }
    }
}

fn extract_access(req: &HttpRequest) -> Result<AccessBearer, Error> {
    let token = bearer_token(req)?;
    let user = state(req)?
        .tokens
        .verify_access(token)
        .map_err(map_token_error)?;
    Ok(AccessBearer(user))
}

fn extract_refresh(req: &HttpRequest) -> Result<RefreshBearer, Error> {
    let token = bearer_token(req)?;
    let user_id = state(req)?
        .tokens
        .verify_refresh(token)
        .map_err(map_token_error)?;
    Ok(RefreshBearer(RefreshRequest {
        user_id,
        token: Zeroizing::new(token.to_owned()),
    }))
}

impl FromRequest for AccessBearer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract_access(req))
    }
}

impl FromRequest for RefreshBearer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract_refresh(req))
    }
}
