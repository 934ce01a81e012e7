//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `STOREFRONT_*` environment variables and
//! config files, in OrthoConfig's usual precedence. Unset optional keys fall
//! back to the defaults exposed by the accessors below.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::outbound::security::JwtConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 10;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

const DEV_ACCESS_SECRET: &str = "storefront-dev-access-secret";
const DEV_REFRESH_SECRET: &str = "storefront-dev-refresh-secret";

/// Start-up configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A required key has no value.
    #[error("{key} must be set")]
    Missing { key: &'static str },
    /// Both token secrets hold the same value.
    #[error("jwt_access_secret and jwt_refresh_secret must differ")]
    IdenticalSecrets,
    /// A key holds a value outside its accepted range or shape.
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
    /// Sources could not be read or merged.
    #[error("failed to load settings: {message}")]
    Load { message: String },
}

/// Runtime settings for the storefront server.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct AppSettings {
    /// Socket the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// HS256 secret for access tokens.
    pub jwt_access_secret: Option<String>,
    /// HS256 secret for refresh tokens.
    pub jwt_refresh_secret: Option<String>,
    pub access_token_ttl_minutes: Option<i64>,
    pub refresh_token_ttl_days: Option<i64>,
    /// Requests allowed per client within one window.
    pub rate_limit_requests: Option<u32>,
    pub rate_limit_window_secs: Option<u64>,
    /// Apply embedded migrations before serving; on unless set to `false`.
    pub run_migrations: Option<bool>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_configured", &self.database_url.is_some())
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("run_migrations", &self.run_migrations)
            .finish_non_exhaustive()
    }
}

/// Load settings from the process arguments and environment.
///
/// # Errors
///
/// Returns [`SettingsError::Load`] when a source cannot be parsed.
pub fn load_settings() -> Result<AppSettings, SettingsError> {
    AppSettings::load().map_err(|err| SettingsError::Load {
        message: err.to_string(),
    })
}

impl AppSettings {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when the value is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
            key: "bind_addr",
            message: err.to_string(),
        })
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Whether embedded migrations run at start-up.
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Quota for the rate limiter as `(requests, window)`.
    pub fn rate_limit(&self) -> (u32, Duration) {
        let requests = self
            .rate_limit_requests
            .unwrap_or(DEFAULT_RATE_LIMIT_REQUESTS);
        let window = self
            .rate_limit_window_secs
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);
        (requests, Duration::from_secs(window))
    }

    /// Token secrets and lifetimes.
    ///
    /// Debug builds substitute development secrets when none are configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a secret is missing, both secrets are
    /// equal, or a lifetime is not positive.
    pub fn jwt_config(&self) -> Result<JwtConfig, SettingsError> {
        self.jwt_config_with(cfg!(debug_assertions))
    }

    fn jwt_config_with(&self, allow_dev_secrets: bool) -> Result<JwtConfig, SettingsError> {
        let access_secret = secret(
            self.jwt_access_secret.as_deref(),
            "jwt_access_secret",
            allow_dev_secrets.then_some(DEV_ACCESS_SECRET),
        )?;
        let refresh_secret = secret(
            self.jwt_refresh_secret.as_deref(),
            "jwt_refresh_secret",
            allow_dev_secrets.then_some(DEV_REFRESH_SECRET),
        )?;
        if access_secret == refresh_secret {
            return Err(SettingsError::IdenticalSecrets);
        }

        let access_minutes = positive(
            self.access_token_ttl_minutes
                .unwrap_or(DEFAULT_ACCESS_TTL_MINUTES),
            "access_token_ttl_minutes",
        )?;
        let refresh_days = positive(
            self.refresh_token_ttl_days.unwrap_or(DEFAULT_REFRESH_TTL_DAYS),
            "refresh_token_ttl_days",
        )?;

        Ok(JwtConfig {
            access_secret,
            refresh_secret,
            access_ttl: chrono::Duration::minutes(access_minutes),
            refresh_ttl: chrono::Duration::days(refresh_days),
        })
    }
}

fn secret(
    value: Option<&str>,
    key: &'static str,
    fallback: Option<&'static str>,
) -> Result<String, SettingsError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Ok(value.to_owned()),
        None => match fallback {
            Some(dev) => {
                warn!(key, "using development token secret (debug builds only)");
                Ok(dev.to_owned())
            }
            None => Err(SettingsError::Missing { key }),
        },
    }
}

fn positive(value: i64, key: &'static str) -> Result<i64, SettingsError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(SettingsError::Invalid {
            key,
            message: format!("must be positive, got {value}"),
        })
    }
}
