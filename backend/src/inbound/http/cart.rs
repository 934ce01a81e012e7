//! Shopping cart handlers.
//!
//! Every route acts on the caller's open cart and responds with the whole
//! refreshed cart, totals included.
//!
//! ```text
//! GET /cart
//! POST /cart/items {"productId":"…","quantity":2}
//! PATCH /cart/items/{id} {"quantity":3}
//! DELETE /cart/items/{id}
//! DELETE /cart
//! POST /cart/merge {"items":[{"productId":"…","quantity":1}]}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{AddCartItemRequest, UpdateCartItemRequest};
use crate::domain::{CartItemId, CartLine, CartView, Error, GuestCartLine, ProductId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::AccessBearer;
use crate::inbound::http::products::ProductResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_quantity, parse_required_uuid, parse_uuid, require,
};

const PRODUCT_ID: FieldName = FieldName::new("productId");
const QUANTITY: FieldName = FieldName::new("quantity");
const ITEMS: FieldName = FieldName::new("items");
const ID: FieldName = FieldName::new("id");

/// One cart line with its product.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub product: ProductResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let CartLine { item, product } = line;
        Self {
            id: *item.id.as_uuid(),
            cart_id: *item.cart_id.as_uuid(),
            product_id: *item.product_id.as_uuid(),
            quantity: item.quantity.get(),
            product: product.into(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// The caller's open cart with derived totals.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_items: Vec<CartItemResponse>,
    /// Σ price × quantity.
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 37.5)]
    pub total_price: Decimal,
    /// Σ quantity.
    pub total_items: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CartView> for CartResponse {
    type Error = Error;

    fn try_from(view: CartView) -> Result<Self, Self::Error> {
        let total_price = view
            .total_price()
            .ok_or_else(|| Error::internal("cart total overflowed"))?;
        let total_items = view.total_items();
        let CartView { cart, lines } = view;
        Ok(Self {
            id: *cart.id.as_uuid(),
            user_id: *cart.user_id.as_uuid(),
            cart_items: lines.into_iter().map(Into::into).collect(),
            total_price,
            total_items,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }
}

/// Body for `POST /cart/items`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemBody {
    #[schema(value_type = Option<String>, format = Uuid)]
    pub product_id: Option<String>,
    #[schema(value_type = Option<i64>, minimum = 1, example = 2)]
    pub quantity: Option<Number>,
}

/// Body for `PATCH /cart/items/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemBody {
    #[schema(value_type = Option<i64>, minimum = 1, example = 3)]
    pub quantity: Option<Number>,
}

/// Guest cart line submitted for merging.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartItem {
    pub product_id: String,
    #[schema(value_type = f64, example = 1)]
    pub quantity: Number,
}

/// Body for `POST /cart/merge`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartBody {
    pub items: Option<Vec<MergeCartItem>>,
}

fn item_id(raw: &str) -> ApiResult<CartItemId> {
    parse_uuid(raw, ID).map(CartItemId::from_uuid)
}

/// Guest lines pass through unvalidated; the service checks each one and
/// skips failures.
fn guest_lines(items: Vec<MergeCartItem>) -> Vec<GuestCartLine> {
    items
        .into_iter()
        .map(|item| GuestCartLine {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect()
}

/// Fetch the open cart, creating it on first access.
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Open cart", body = CartResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "getCart",
    security(("bearer" = []))
)]
#[get("")]
pub async fn get_cart(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
) -> ApiResult<web::Json<CartResponse>> {
    let view = state.cart_query.get_or_create(&bearer.0.user_id).await?;
    Ok(web::Json(view.try_into()?))
}

/// Add units of a product, summing with an existing line.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddCartItemBody,
    responses(
        (status = 201, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Invalid request, inactive product or insufficient stock", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "addCartItem",
    security(("bearer" = []))
)]
#[post("/items")]
pub async fn add_item(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    payload: web::Json<AddCartItemBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let product_id = parse_required_uuid(body.product_id, PRODUCT_ID)?;
    let quantity = parse_quantity(body.quantity, QUANTITY)?;
    let view = state
        .cart
        .add_item(AddCartItemRequest {
            user_id: bearer.0.user_id,
            product_id: ProductId::from_uuid(product_id),
            quantity,
        })
        .await?;
    Ok(HttpResponse::Created().json(CartResponse::try_from(view)?))
}

/// Overwrite a line's quantity.
#[utoipa::path(
    patch,
    path = "/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartItemBody,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Invalid quantity or insufficient stock", body = ErrorSchema),
        (status = 404, description = "Cart item not found", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "updateCartItem",
    security(("bearer" = []))
)]
#[patch("/items/{id}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
    payload: web::Json<UpdateCartItemBody>,
) -> ApiResult<web::Json<CartResponse>> {
    let item_id = item_id(&path)?;
    let quantity = parse_quantity(payload.into_inner().quantity, QUANTITY)?;
    let view = state
        .cart
        .update_item(UpdateCartItemRequest {
            user_id: bearer.0.user_id,
            item_id,
            quantity,
        })
        .await?;
    Ok(web::Json(view.try_into()?))
}

/// Delete one line.
#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "Cart item not found", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "removeCartItem",
    security(("bearer" = []))
)]
#[delete("/items/{id}")]
pub async fn remove_item(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
) -> ApiResult<web::Json<CartResponse>> {
    let item_id = item_id(&path)?;
    let view = state.cart.remove_item(&bearer.0.user_id, &item_id).await?;
    Ok(web::Json(view.try_into()?))
}

/// Delete every line of the open cart.
#[utoipa::path(
    delete,
    path = "/cart",
    responses(
        (status = 200, description = "Emptied cart", body = CartResponse)
    ),
    tags = ["cart"],
    operation_id = "clearCart",
    security(("bearer" = []))
)]
#[delete("")]
pub async fn clear_cart(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
) -> ApiResult<web::Json<CartResponse>> {
    let view = state.cart.clear(&bearer.0.user_id).await?;
    Ok(web::Json(view.try_into()?))
}

/// Fold a guest cart into the caller's cart, skipping lines that fail.
#[utoipa::path(
    post,
    path = "/cart/merge",
    request_body = MergeCartBody,
    responses(
        (status = 200, description = "Merged cart", body = CartResponse),
        (status = 400, description = "Malformed item list", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "mergeCart",
    security(("bearer" = []))
)]
#[post("/merge")]
pub async fn merge_cart(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    payload: web::Json<MergeCartBody>,
) -> ApiResult<web::Json<CartResponse>> {
    let items = require(payload.into_inner().items, ITEMS)?;
    let lines = guest_lines(items);
    let view = state.cart.merge(&bearer.0.user_id, lines).await?;
    Ok(web::Json(view.try_into()?))
}

#[cfg(test)]
#[path = "cart_tests.rs"]
mod tests;
