//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

#[cfg(debug_assertions)]
use storefront::ApiDoc;
use storefront::inbound::http::configure;
use storefront::inbound::http::health::HealthState;
use storefront::inbound::http::state::HttpState;
use storefront::{RateLimit, Trace};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    rate_limit: RateLimit,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        rate_limit,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(rate_limit)
        .wrap(Trace)
        .configure(configure);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] with the bind address, token
///   settings, rate limit and optional database pool.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config);
    let ServerConfig {
        bind_addr,
        rate_limit,
        jwt: _,
        db_pool: _,
    } = config;
    let rate_limit = rate_limit.exempt("/health");

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            rate_limit: rate_limit.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use storefront::outbound::security::JwtConfig;

    fn deps(requests: u32) -> AppDependencies {
        let config = ServerConfig::new(
            "127.0.0.1:0".parse().expect("socket address"),
            JwtConfig {
                access_secret: "access".to_owned(),
                refresh_secret: "refresh".to_owned(),
                access_ttl: chrono::Duration::minutes(15),
                refresh_ttl: chrono::Duration::days(7),
            },
            RateLimit::new(requests, Duration::from_secs(60)).expect("quota"),
        );
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: build_http_state(&config),
            rate_limit: config.rate_limit.exempt("/health"),
        }
    }

    #[actix_web::test]
    async fn responses_carry_trace_id() {
        let app = actix_test::init_service(build_app(deps(10))).await;
        let req = actix_test::TestRequest::get().uri("/products").to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("trace-id"));
    }

    #[actix_web::test]
    async fn rate_limit_spares_health_checks() {
        let app = actix_test::init_service(build_app(deps(1))).await;
        let peer = "10.1.1.1:4000".parse().expect("socket address");

        let first = actix_test::TestRequest::get()
            .uri("/products")
            .peer_addr(peer)
            .to_request();
        assert_eq!(actix_test::call_service(&app, first).await.status(), StatusCode::OK);

        let limited = actix_test::TestRequest::get()
            .uri("/products")
            .peer_addr(peer)
            .to_request();
        let res = actix_test::call_service(&app, limited).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let header = res
            .headers()
            .get("trace-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("trace-id header");
        let body: serde_json::Value = actix_test::read_body_json(res).await;
        assert_eq!(body["code"], "too_many_requests");
        assert_eq!(body["traceId"], header.as_str());

        let health = actix_test::TestRequest::get()
            .uri("/health/ready")
            .peer_addr(peer)
            .to_request();
        assert_eq!(actix_test::call_service(&app, health).await.status(), StatusCode::OK);
    }
}
