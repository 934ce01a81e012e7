//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use storefront::RateLimit;
use storefront::outbound::persistence::DbPool;
use storefront::outbound::security::JwtConfig;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) jwt: JwtConfig,
    pub(crate) rate_limit: RateLimit,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration backed by the in-memory store.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, jwt: JwtConfig, rate_limit: RateLimit) -> Self {
        Self {
            bind_addr,
            jwt,
            rate_limit,
            db_pool: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, every repository port uses its Diesel adapter instead
    /// of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
