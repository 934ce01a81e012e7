//! Authentication API handlers.
//!
//! ```text
//! POST /auth/register {"email":"ada@example.com","password":"…","firstName":"Ada","lastName":"Lovelace"}
//! POST /auth/login {"email":"ada@example.com","password":"…"}
//! POST /auth/refresh   (Authorization: Bearer <refresh token>)
//! POST /auth/logout    (Authorization: Bearer <access token>)
//! ```

use actix_web::{HttpResponse, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{AuthSession, LoginCredentials, RegistrationDetails, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::{AccessBearer, RefreshBearer};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, map_auth_validation_error, require};

const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");
const FIRST_NAME: FieldName = FieldName::new("firstName");
const LAST_NAME: FieldName = FieldName::new("lastName");

/// Registration body for `POST /auth/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "correct horse battery", min_length = 8, max_length = 128)]
    pub password: Option<String>,
    #[schema(example = "Ada", max_length = 50)]
    pub first_name: Option<String>,
    #[schema(example = "Lovelace", max_length = 50)]
    pub last_name: Option<String>,
}

impl TryFrom<RegisterRequest> for RegistrationDetails {
    type Error = crate::domain::Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let email = require(value.email, EMAIL)?;
        let password = zeroize::Zeroizing::new(require(value.password, PASSWORD)?);
        let first_name = require(value.first_name, FIRST_NAME)?;
        let last_name = require(value.last_name, LAST_NAME)?;
        Self::try_from_parts(&email, &password, &first_name, &last_name)
            .map_err(map_auth_validation_error)
    }
}

/// Login body for `POST /auth/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = crate::domain::Error;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        let email = require(value.email, EMAIL)?;
        let password = zeroize::Zeroizing::new(require(value.password, PASSWORD)?);
        Self::try_from_parts(&email, &password).map_err(map_auth_validation_error)
    }
}

/// Public user profile.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "customer")]
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            email: user.email.into(),
            first_name: user.first_name.as_ref().to_owned(),
            last_name: user.last_name.as_ref().to_owned(),
            role: user.role.as_str().to_owned(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Token pair plus the authenticated user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            user: session.user.into(),
        }
    }
}

/// Body returned by `POST /auth/logout`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Successfully logged out")]
    pub message: String,
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 429, description = "Rate limited", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let details = RegistrationDetails::try_from(payload.into_inner())?;
    let session = state.auth.register(details).await?;
    Ok(HttpResponse::Created().json(AuthResponse::from(session)))
}

/// Exchange credentials for a token pair.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid email or password", body = ErrorSchema),
        (status = 429, description = "Rate limited", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())?;
    let session = state.auth.login(credentials).await?;
    Ok(web::Json(session.into()))
}

/// Rotate the token pair using the refresh token.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Refresh token missing, expired or revoked", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "refresh",
    security(("bearer" = []))
)]
#[post("/refresh")]
pub async fn refresh(
    state: web::Data<HttpState>,
    bearer: RefreshBearer,
) -> ApiResult<web::Json<AuthResponse>> {
    let session = state.auth.refresh(bearer.0).await?;
    Ok(web::Json(session.into()))
}

/// Revoke the stored refresh token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "logout",
    security(("bearer" = []))
)]
#[post("/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
) -> ApiResult<web::Json<MessageResponse>> {
    state.auth.logout(&bearer.0.user_id).await?;
    Ok(web::Json(MessageResponse {
        message: "Successfully logged out".to_owned(),
    }))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
