//! Order handlers: checkout from the open cart, history and cancellation.
//!
//! ```text
//! POST /orders
//! GET /orders
//! GET /orders/{id}
//! POST /orders/{id}/cancel
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, Order, OrderId, OrderLine};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::AccessBearer;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

const ID: FieldName = FieldName::new("id");

/// Order line with the price captured at checkout.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

impl TryFrom<OrderLine> for OrderItemResponse {
    type Error = Error;

    fn try_from(line: OrderLine) -> Result<Self, Self::Error> {
        let subtotal = line
            .subtotal()
            .ok_or_else(|| Error::internal("order line subtotal overflowed"))?;
        Ok(Self {
            id: *line.id.as_uuid(),
            product_id: *line.product_id.as_uuid(),
            product_name: line.product_name,
            quantity: line.quantity.get(),
            unit_price: line.unit_price.amount(),
            subtotal,
        })
    }
}

/// Placed order.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `pending`, `paid` or `cancelled`.
    #[schema(example = "pending")]
    pub status: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 37.5)]
    pub total_amount: Decimal,
    pub total_items: u64,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Order> for OrderResponse {
    type Error = Error;

    fn try_from(order: Order) -> Result<Self, Self::Error> {
        let total_items = order.total_items();
        Ok(Self {
            id: *order.id.as_uuid(),
            user_id: *order.user_id.as_uuid(),
            status: order.status.as_str().to_owned(),
            total_amount: order.total_amount,
            total_items,
            items: order
                .lines
                .into_iter()
                .map(OrderItemResponse::try_from)
                .collect::<Result<_, _>>()?,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

pub(crate) fn order_id(raw: &str) -> ApiResult<OrderId> {
    parse_uuid(raw, ID).map(OrderId::from_uuid)
}

/// Turn the open cart into a pending order.
#[utoipa::path(
    post,
    path = "/orders",
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Cart empty or stock insufficient", body = ErrorSchema),
        (status = 409, description = "Cart checked out by a concurrent request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "checkout",
    security(("bearer" = []))
)]
#[post("")]
pub async fn checkout(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
) -> ApiResult<HttpResponse> {
    let order = state.orders.checkout(&bearer.0.user_id).await?;
    Ok(HttpResponse::Created().json(OrderResponse::try_from(order)?))
}

/// The caller's orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Orders", body = [OrderResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "listOrders",
    security(("bearer" = []))
)]
#[get("")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
) -> ApiResult<web::Json<Vec<OrderResponse>>> {
    let orders = state.orders_query.list(&bearer.0.user_id).await?;
    let body = orders
        .into_iter()
        .map(OrderResponse::try_from)
        .collect::<Result<_, _>>()?;
    Ok(web::Json(body))
}

/// One of the caller's orders.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "getOrder",
    security(("bearer" = []))
)]
#[get("/{id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
) -> ApiResult<web::Json<OrderResponse>> {
    let id = order_id(&path)?;
    let order = state.orders_query.get(&bearer.0.user_id, &id).await?;
    Ok(web::Json(order.try_into()?))
}

/// Cancel a pending order and restock its lines.
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Cancelled order", body = OrderResponse),
        (status = 400, description = "Order is not pending", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "cancelOrder",
    security(("bearer" = []))
)]
#[post("/{id}/cancel")]
pub async fn cancel_order(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
) -> ApiResult<web::Json<OrderResponse>> {
    let id = order_id(&path)?;
    let order = state.orders.cancel(&bearer.0.user_id, &id).await?;
    Ok(web::Json(order.try_into()?))
}
