//! Payment handlers nested under an order.
//!
//! ```text
//! POST /orders/{id}/payments {"method":"card"}
//! GET /orders/{id}/payments
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Payment, PaymentMethod};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::AccessBearer;
use crate::inbound::http::orders::order_id;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, require};

const METHOD: FieldName = FieldName::new("method");

/// Body for `POST /orders/{id}/payments`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// One of `card`, `paypal`, `bank_transfer`.
    #[schema(example = "card")]
    pub method: Option<String>,
}

impl TryFrom<CreatePaymentRequest> for PaymentMethod {
    type Error = crate::domain::Error;

    fn try_from(value: CreatePaymentRequest) -> Result<Self, Self::Error> {
        let raw = require(value.method, METHOD)?;
        raw.trim().parse().map_err(|_| {
            invalid_field_error("method", "method must be one of card, paypal, bank_transfer")
        })
    }
}

/// Recorded payment.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 37.5)]
    pub amount: Decimal,
    #[schema(example = "card")]
    pub method: String,
    #[schema(example = "completed")]
    pub status: String,
    pub provider_reference: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: *payment.id.as_uuid(),
            order_id: *payment.order_id.as_uuid(),
            amount: payment.amount,
            method: payment.method.as_str().to_owned(),
            status: payment.status.as_str().to_owned(),
            provider_reference: payment.provider_reference,
            created_at: payment.created_at,
        }
    }
}

/// Settle a pending order for its full amount.
#[utoipa::path(
    post,
    path = "/orders/{id}/payments",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid method or cancelled order", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema),
        (status = 409, description = "Order already paid", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "payOrder",
    security(("bearer" = []))
)]
#[post("/{id}/payments")]
pub async fn pay_order(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
    payload: web::Json<CreatePaymentRequest>,
) -> ApiResult<HttpResponse> {
    let id = order_id(&path)?;
    let method = PaymentMethod::try_from(payload.into_inner())?;
    let payment = state.payments.pay(&bearer.0.user_id, &id, method).await?;
    Ok(HttpResponse::Created().json(PaymentResponse::from(payment)))
}

/// Payments recorded against one of the caller's orders.
#[utoipa::path(
    get,
    path = "/orders/{id}/payments",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Payments", body = [PaymentResponse]),
        (status = 404, description = "Order not found", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "listPayments",
    security(("bearer" = []))
)]
#[get("/{id}/payments")]
pub async fn list_payments(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<PaymentResponse>>> {
    let id = order_id(&path)?;
    let payments = state.payments_query.list(&bearer.0.user_id, &id).await?;
    Ok(web::Json(payments.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, OrderId, PaymentId, PaymentStatus, UserRole};
    use crate::inbound::http::test_utils::{BEARER, MockPorts, caller};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn payment(order_id: OrderId, method: PaymentMethod) -> Payment {
        Payment {
            id: PaymentId::random(),
            order_id,
            amount: Decimal::new(3750, 2),
            method,
            status: PaymentStatus::Completed,
            provider_reference: "sim_0001".to_owned(),
            created_at: Utc::now(),
        }
    }

    async fn call(
        ports: MockPorts,
        request: actix_test::TestRequest,
    ) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new().app_data(ports.into_state()).service(
                web::scope("/orders")
                    .service(pay_order)
                    .service(list_payments),
            ),
        )
        .await;
        actix_test::call_service(&app, request.to_request()).await
    }

    #[rstest]
    #[case("card", PaymentMethod::Card)]
    #[case("paypal", PaymentMethod::Paypal)]
    #[case("bank_transfer", PaymentMethod::BankTransfer)]
    #[actix_web::test]
    async fn pay_accepts_known_methods(#[case] raw: &str, #[case] method: PaymentMethod) {
        let mut ports = MockPorts::default().signed_in_as(caller(UserRole::Customer));
        ports
            .payments
            .expect_pay()
            .withf(move |_, _, chosen| *chosen == method)
            .return_once(|_, order_id, method| Ok(payment(*order_id, method)));

        let res = call(
            ports,
            actix_test::TestRequest::post()
                .uri(&format!("/orders/{}/payments", Uuid::new_v4()))
                .insert_header(BEARER)
                .set_json(json!({"method": raw})),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["method"], raw);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["amount"], json!(37.5));
    }

    #[rstest]
    #[case(json!({}), "missing required field: method")]
    #[case(json!({"method": "cash"}), "method must be one of card, paypal, bank_transfer")]
    #[actix_web::test]
    async fn pay_rejects_unknown_methods(#[case] payload: Value, #[case] message: &str) {
        let ports = MockPorts::default().signed_in_as(caller(UserRole::Customer));

        let res = call(
            ports,
            actix_test::TestRequest::post()
                .uri(&format!("/orders/{}/payments", Uuid::new_v4()))
                .insert_header(BEARER)
                .set_json(payload),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], message);
    }

    #[actix_web::test]
    async fn paying_twice_is_conflict() {
        let mut ports = MockPorts::default().signed_in_as(caller(UserRole::Customer));
        ports
            .payments
            .expect_pay()
            .return_once(|_, _, _| Err(Error::conflict("Order is already paid")));

        let res = call(
            ports,
            actix_test::TestRequest::post()
                .uri(&format!("/orders/{}/payments", Uuid::new_v4()))
                .insert_header(BEARER)
                .set_json(json!({"method": "card"})),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn list_returns_recorded_payments() {
        let mut ports = MockPorts::default().signed_in_as(caller(UserRole::Customer));
        ports
            .payments_query
            .expect_list()
            .return_once(|_, order_id| Ok(vec![payment(*order_id, PaymentMethod::Paypal)]));

        let res = call(
            ports,
            actix_test::TestRequest::get()
                .uri(&format!("/orders/{}/payments", Uuid::new_v4()))
                .insert_header(BEARER),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body[0]["providerReference"], "sim_0001");
    }
}
