//! Storefront entry-point: loads settings, wires adapters and serves the API.

mod server;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server};
use storefront::RateLimit;
use storefront::inbound::http::health::HealthState;
use storefront::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use storefront::settings::{AppSettings, load_settings};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = load_settings().map_err(std::io::Error::other)?;
    let config = server_config(&settings).await?;
    info!(bind_addr = %config.bind_addr(), "starting storefront server");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}

async fn server_config(settings: &AppSettings) -> std::io::Result<ServerConfig> {
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let jwt = settings.jwt_config().map_err(std::io::Error::other)?;
    let (requests, window) = settings.rate_limit();
    let rate_limit = RateLimit::new(requests, window).map_err(std::io::Error::other)?;
    let config = ServerConfig::new(bind_addr, jwt, rate_limit);

    let Some(database_url) = settings.database_url() else {
        warn!("no database_url configured; using the in-memory store (data is lost on restart)");
        return Ok(config);
    };

    if settings.run_migrations() {
        run_migrations(database_url)
            .await
            .map_err(std::io::Error::other)?;
    }
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(std::io::Error::other)?;
    Ok(config.with_db_pool(pool))
}
