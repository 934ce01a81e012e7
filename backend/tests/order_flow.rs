//! Checkout, payment, cancellation and catalogue administration end to end.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use storefront::test_support::TestApp;

mod support;

use support::app::{RELAXED_QUOTA, bearer, init_app, login, register, send};

fn add(token: &str, product_id: impl ToString, quantity: i64) -> actix_test::TestRequest {
    bearer(actix_test::TestRequest::post().uri("/cart/items"), token).set_json(json!({
        "productId": product_id.to_string(),
        "quantity": quantity,
    }))
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("id").to_owned()
}

#[actix_web::test]
async fn empty_cart_cannot_be_checked_out() {
    let world = TestApp::new();
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let session = register(&app, "ada@example.com").await;

    let reply = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/orders"), &session.access),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["message"], "Cart is empty");
}

#[actix_web::test]
async fn checkout_pay_and_refuse_a_second_payment() {
    let world = TestApp::new();
    let mug = world.seed_product("Mug", Decimal::new(1250, 2), 5).await;
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let session = register(&app, "ada@example.com").await;
    let added = send(&app, add(&session.access, mug.id, 3)).await;
    let cart_id = id_of(&added.body);

    let order = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/orders"), &session.access),
    )
    .await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["status"], "pending");
    assert_eq!(order.body["totalAmount"], json!(37.5));
    assert_eq!(order.body["items"][0]["unitPrice"], json!(12.5));
    let order_id = id_of(&order.body);

    let product = send(&app, actix_test::TestRequest::get().uri(&format!("/products/{}", mug.id))).await;
    assert_eq!(product.body["stock"], 2);

    let fresh = send(&app, bearer(actix_test::TestRequest::get().uri("/cart"), &session.access)).await;
    assert_ne!(id_of(&fresh.body), cart_id);
    assert_eq!(fresh.body["totalItems"], 0);

    let paid = send(
        &app,
        bearer(
            actix_test::TestRequest::post().uri(&format!("/orders/{order_id}/payments")),
            &session.access,
        )
        .set_json(json!({"method": "card"})),
    )
    .await;
    assert_eq!(paid.status, StatusCode::CREATED);
    assert_eq!(paid.body["amount"], json!(37.5));
    assert_eq!(paid.body["status"], "completed");
    assert!(
        paid.body["providerReference"]
            .as_str()
            .is_some_and(|reference| reference.starts_with("sim_"))
    );

    let again = send(
        &app,
        bearer(
            actix_test::TestRequest::post().uri(&format!("/orders/{order_id}/payments")),
            &session.access,
        )
        .set_json(json!({"method": "paypal"})),
    )
    .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let fetched = send(
        &app,
        bearer(
            actix_test::TestRequest::get().uri(&format!("/orders/{order_id}")),
            &session.access,
        ),
    )
    .await;
    assert_eq!(fetched.body["status"], "paid");

    let payments = send(
        &app,
        bearer(
            actix_test::TestRequest::get().uri(&format!("/orders/{order_id}/payments")),
            &session.access,
        ),
    )
    .await;
    assert_eq!(payments.body.as_array().map(Vec::len), Some(1));

    let cancel = send(
        &app,
        bearer(
            actix_test::TestRequest::post().uri(&format!("/orders/{order_id}/cancel")),
            &session.access,
        ),
    )
    .await;
    assert_eq!(cancel.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn cancelling_restocks_and_blocks_payment() {
    let world = TestApp::new();
    let mug = world.seed_product("Mug", Decimal::new(1250, 2), 5).await;
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let session = register(&app, "ada@example.com").await;
    send(&app, add(&session.access, mug.id, 4)).await;
    let order = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/orders"), &session.access),
    )
    .await;
    let order_id = id_of(&order.body);

    let cancelled = send(
        &app,
        bearer(
            actix_test::TestRequest::post().uri(&format!("/orders/{order_id}/cancel")),
            &session.access,
        ),
    )
    .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["status"], "cancelled");

    let product = send(&app, actix_test::TestRequest::get().uri(&format!("/products/{}", mug.id))).await;
    assert_eq!(product.body["stock"], 5);

    let pay = send(
        &app,
        bearer(
            actix_test::TestRequest::post().uri(&format!("/orders/{order_id}/payments")),
            &session.access,
        )
        .set_json(json!({"method": "bank_transfer"})),
    )
    .await;
    assert_eq!(pay.status, StatusCode::BAD_REQUEST);
    assert_eq!(pay.body["message"], "Cannot pay for a cancelled order");
}

#[actix_web::test]
async fn orders_are_private_to_their_owner() {
    let world = TestApp::new();
    let mug = world.seed_product("Mug", Decimal::new(1250, 2), 5).await;
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let owner = register(&app, "ada@example.com").await;
    let other = register(&app, "eve@example.com").await;
    send(&app, add(&owner.access, mug.id, 1)).await;
    let order = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/orders"), &owner.access),
    )
    .await;
    let order_id = id_of(&order.body);

    let peek = send(
        &app,
        bearer(
            actix_test::TestRequest::get().uri(&format!("/orders/{order_id}")),
            &other.access,
        ),
    )
    .await;
    let listing = send(
        &app,
        bearer(actix_test::TestRequest::get().uri("/orders"), &other.access),
    )
    .await;

    assert_eq!(peek.status, StatusCode::NOT_FOUND);
    assert_eq!(listing.body, json!([]));
}

#[actix_web::test]
async fn only_admins_manage_the_catalogue() {
    let world = TestApp::new();
    world.seed_admin("admin@example.com", "admin password").await;
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let admin = login(&app, "admin@example.com", "admin password").await;
    let customer = register(&app, "ada@example.com").await;
    let draft = json!({"name": "Lamp", "description": "Brass", "price": 40.5, "stock": 2});

    let forbidden = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/products"), &customer.access).set_json(&draft),
    )
    .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["code"], "forbidden");

    let created = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/products"), &admin.access).set_json(&draft),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["price"], json!(40.5));
    assert_eq!(created.body["isActive"], true);
    let product_id = id_of(&created.body);

    let patched = send(
        &app,
        bearer(
            actix_test::TestRequest::patch().uri(&format!("/products/{product_id}")),
            &admin.access,
        )
        .set_json(json!({"stock": 7})),
    )
    .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["stock"], 7);
    assert_eq!(patched.body["name"], "Lamp");

    let removed = send(
        &app,
        bearer(
            actix_test::TestRequest::delete().uri(&format!("/products/{product_id}")),
            &admin.access,
        ),
    )
    .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["isActive"], false);

    let listing = send(&app, actix_test::TestRequest::get().uri("/products")).await;
    assert_eq!(listing.body, json!([]));
}

#[actix_web::test]
async fn prices_beyond_the_stored_range_are_rejected() {
    let world = TestApp::new();
    world.seed_admin("admin@example.com", "admin password").await;
    let app = init_app(world.state.clone(), RELAXED_QUOTA).await;
    let admin = login(&app, "admin@example.com", "admin password").await;

    let reply = send(
        &app,
        bearer(actix_test::TestRequest::post().uri("/products"), &admin.access)
            .set_json(json!({"name": "Yacht", "price": 5e28, "stock": 1})),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["details"]["field"], "price");
    assert_eq!(send(&app, actix_test::TestRequest::get().uri("/products")).await.body, json!([]));
}
