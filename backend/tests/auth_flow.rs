//! End-to-end account flows: register, login, refresh rotation and logout.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};
use storefront::test_support::TestApp;

mod support;

use support::app::{PASSWORD, RELAXED_QUOTA, bearer, init_app, login, register, send};

#[actix_web::test]
async fn register_then_login_yields_distinct_token_pairs() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;

    let registered = register(&app, "  Ada@Example.com ").await;
    let first = login(&app, "ada@example.com", PASSWORD).await;
    let second = login(&app, "ada@example.com", PASSWORD).await;

    assert_eq!(first.user_id, registered.user_id);
    assert_ne!(first.access, second.access);
    assert_ne!(first.refresh, second.refresh);
}

#[actix_web::test]
async fn register_response_hides_credentials() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;

    let reply = send(
        &app,
        actix_test::TestRequest::post().uri("/auth/register").set_json(json!({
            "email": "grace@example.com",
            "password": PASSWORD,
            "firstName": "Grace",
            "lastName": "Hopper",
        })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    let user = &reply.body["user"];
    assert_eq!(user["email"], "grace@example.com");
    assert_eq!(user["role"], "customer");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("refreshToken").is_none());
}

#[actix_web::test]
async fn duplicate_email_is_conflict() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    register(&app, "ada@example.com").await;

    let reply = send(
        &app,
        actix_test::TestRequest::post().uri("/auth/register").set_json(json!({
            "email": "ADA@example.com",
            "password": PASSWORD,
            "firstName": "Ada",
            "lastName": "Again",
        })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["code"], "conflict");
    assert_eq!(reply.body["message"], "User with this email already exists");
    assert_eq!(reply.body["traceId"].as_str(), reply.trace_id.as_deref());
}

#[rstest]
#[case("ada@example.com", "wrong password")]
#[case("nobody@example.com", PASSWORD)]
#[actix_web::test]
async fn bad_credentials_share_one_message(#[case] email: &str, #[case] password: &str) {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    register(&app, "ada@example.com").await;

    let reply = send(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": email, "password": password})),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["message"], "Invalid email or password");
}

#[actix_web::test]
async fn refresh_rotates_and_revokes_the_previous_token() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let session = register(&app, "ada@example.com").await;

    let rotated = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/auth/refresh"), &session.refresh),
    )
    .await;
    assert_eq!(rotated.status, StatusCode::OK);
    let new_refresh = rotated.body["refreshToken"]
        .as_str()
        .expect("refresh token")
        .to_owned();
    assert_ne!(new_refresh, session.refresh);

    let replay = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/auth/refresh"), &session.refresh),
    )
    .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.body["message"], "Refresh token revoked");
}

#[actix_web::test]
async fn access_token_is_not_a_refresh_token() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let session = register(&app, "ada@example.com").await;

    let reply = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/auth/refresh"), &session.access),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn logout_revokes_refresh() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let session = register(&app, "ada@example.com").await;

    let logout = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/auth/logout"), &session.access),
    )
    .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body, json!({"message": "Successfully logged out"}));

    let refresh = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/auth/refresh"), &session.refresh),
    )
    .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case(json!({"password": PASSWORD, "firstName": "A", "lastName": "B"}), "email")]
#[case(json!({"email": "a@example.com", "password": "short", "firstName": "A", "lastName": "B"}), "password")]
#[case(json!({"email": "a@example.com", "password": PASSWORD, "firstName": " ", "lastName": "B"}), "firstName")]
#[case(json!({"email": "not-an-email", "password": PASSWORD, "firstName": "A", "lastName": "B"}), "email")]
#[actix_web::test]
async fn invalid_registration_names_the_field(#[case] payload: Value, #[case] field: &str) {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;

    let reply = send(
        &app,
        actix_test::TestRequest::post().uri("/auth/register").set_json(payload),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "invalid_request");
    assert_eq!(reply.body["details"]["field"], field);
}

#[actix_web::test]
async fn every_response_carries_a_trace_id() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;

    let live = send(&app, actix_test::TestRequest::get().uri("/health/live")).await;
    let missing = send(&app, actix_test::TestRequest::get().uri("/cart")).await;

    assert_eq!(live.status, StatusCode::OK);
    assert!(live.trace_id.is_some());
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert!(missing.trace_id.is_some());
}
