//! Full application wiring over the in-memory store for HTTP tests.

use std::time::Duration;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};
use storefront::inbound::http::health::HealthState;
use storefront::inbound::http::{HttpState, configure};
use storefront::{RateLimit, Trace};

/// Quota generous enough that flow tests never trip it.
pub const RELAXED_QUOTA: u32 = 1_000;

/// Initialise the app the server runs, with `requests` per minute per client.
pub async fn init_app(
    state: HttpState,
    requests: u32,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    let health = web::Data::new(HealthState::new());
    health.mark_ready();
    let limit = RateLimit::new(requests, Duration::from_secs(60))
        .expect("quota")
        .exempt("/health");
    actix_test::init_service(
        App::new()
            .app_data(health)
            .app_data(web::Data::new(state))
            .wrap(limit)
            .wrap(Trace)
            .configure(configure),
    )
    .await
}

/// Captured status, headers and JSON body of one exchange.
pub struct Reply {
    pub status: StatusCode,
    pub trace_id: Option<String>,
    pub retry_after: Option<String>,
    pub body: Value,
}

/// Send `req` and decode the JSON body (`Null` when empty).
pub async fn send<S, B>(app: &S, req: actix_test::TestRequest) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = actix_test::call_service(app, req.to_request()).await;
    let header = |name: &str| {
        res.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let status = res.status();
    let trace_id = header("trace-id");
    let retry_after = header("retry-after");
    let bytes = actix_test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    Reply {
        status,
        trace_id,
        retry_after,
        body,
    }
}

/// Attach `token` as a bearer credential.
pub fn bearer(req: actix_test::TestRequest, token: &str) -> actix_test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {token}")))
}

/// Tokens returned by register or login.
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub user_id: String,
}

impl Session {
    fn from_body(body: &Value) -> Self {
        let field = |pointer: &str| {
            body.pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .expect("auth response field")
        };
        Self {
            access: field("/accessToken"),
            refresh: field("/refreshToken"),
            user_id: field("/user/id"),
        }
    }
}

pub const PASSWORD: &str = "correct horse battery";

/// Register a customer and return their tokens.
pub async fn register<S, B>(app: &S, email: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let reply = send(
        app,
        actix_test::TestRequest::post().uri("/auth/register").set_json(json!({
            "email": email,
            "password": PASSWORD,
            "firstName": "Ada",
            "lastName": "Lovelace",
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "register: {}", reply.body);
    Session::from_body(&reply.body)
}

/// Sign in with `password`.
pub async fn login<S, B>(app: &S, email: &str, password: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let reply = send(
        app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "login: {}", reply.body);
    Session::from_body(&reply.body)
}
