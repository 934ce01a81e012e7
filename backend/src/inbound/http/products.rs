//! Product catalogue handlers.
//!
//! ```text
//! GET /products
//! GET /products/{id}
//! POST /products {"name":"Mug","price":12.5,"stock":10}        (admin)
//! PATCH /products/{id} {"price":11.0,"isActive":false}          (admin)
//! DELETE /products/{id}                                          (admin)
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Product, ProductDraft, ProductId, ProductPatch};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::AccessBearer;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_product_validation_error, parse_integer, parse_uuid, require,
};

const NAME: FieldName = FieldName::new("name");
const PRICE: FieldName = FieldName::new("price");
const STOCK: FieldName = FieldName::new("stock");
const ID: FieldName = FieldName::new("id");

/// Catalogue entry as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    #[schema(example = "Enamel mug")]
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 12.5)]
    pub price: Decimal,
    pub stock: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: *product.id.as_uuid(),
            name: product.name,
            description: product.description,
            price: product.price.amount(),
            stock: product.stock,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Body for `POST /products`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[schema(example = "Enamel mug", max_length = 200)]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>, example = 12.5, minimum = 0)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<i64>, example = 10, minimum = 0)]
    pub stock: Option<Number>,
}

impl TryFrom<CreateProductRequest> for ProductDraft {
    type Error = crate::domain::Error;

    fn try_from(value: CreateProductRequest) -> Result<Self, Self::Error> {
        let name = require(value.name, NAME)?;
        let price = require(value.price, PRICE)?;
        let stock = parse_integer(&require(value.stock, STOCK)?, STOCK)?;
        Self::try_from_parts(&name, value.description.as_deref(), price, stock)
            .map_err(map_product_validation_error)
    }
}

/// Body for `PATCH /products/{id}`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[schema(max_length = 200)]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>, minimum = 0)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<i64>, minimum = 0)]
    pub stock: Option<Number>,
    pub is_active: Option<bool>,
}

impl TryFrom<UpdateProductRequest> for ProductPatch {
    type Error = crate::domain::Error;

    fn try_from(value: UpdateProductRequest) -> Result<Self, Self::Error> {
        let stock = value
            .stock
            .as_ref()
            .map(|raw| parse_integer(raw, STOCK))
            .transpose()?;
        Self::try_from_parts(
            value.name.as_deref(),
            value.description.as_deref(),
            value.price,
            stock,
            value.is_active,
        )
        .map_err(map_product_validation_error)
    }
}

fn product_id(raw: &str) -> ApiResult<ProductId> {
    parse_uuid(raw, ID).map(ProductId::from_uuid)
}

/// Active products ordered by name.
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "Active products", body = [ProductResponse])
    ),
    tags = ["products"],
    operation_id = "listProducts",
    security([])
)]
#[get("")]
pub async fn list_products(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<ProductResponse>>> {
    let products = state.products_query.list().await?;
    Ok(web::Json(products.into_iter().map(Into::into).collect()))
}

/// Fetch one product by id.
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "getProduct",
    security([])
)]
#[get("/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id = product_id(&path)?;
    let product = state.products_query.get(&id).await?;
    Ok(web::Json(product.into()))
}

/// Create an active product.
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "createProduct",
    security(("bearer" = []))
)]
#[post("")]
pub async fn create_product(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    payload: web::Json<CreateProductRequest>,
) -> ApiResult<HttpResponse> {
    let draft = ProductDraft::try_from(payload.into_inner())?;
    let product = state.products.create(&bearer.0, draft).await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// Apply a partial update.
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ProductResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "updateProduct",
    security(("bearer" = []))
)]
#[patch("/{id}")]
pub async fn update_product(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
    payload: web::Json<UpdateProductRequest>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id = product_id(&path)?;
    let patch = ProductPatch::try_from(payload.into_inner())?;
    let product = state.products.update(&bearer.0, &id, patch).await?;
    Ok(web::Json(product.into()))
}

/// Soft-delete: the product stays readable by id but leaves the listing.
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deactivated product", body = ProductResponse),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "deactivateProduct",
    security(("bearer" = []))
)]
#[delete("/{id}")]
pub async fn deactivate_product(
    state: web::Data<HttpState>,
    bearer: AccessBearer,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id = product_id(&path)?;
    let product = state.products.deactivate(&bearer.0, &id).await?;
    Ok(web::Json(product.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, UserRole};
    use crate::inbound::http::test_utils::{BEARER, MockPorts, caller, product};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn call(
        ports: MockPorts,
        request: actix_test::TestRequest,
    ) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new().app_data(ports.into_state()).service(
                web::scope("/products")
                    .service(list_products)
                    .service(get_product)
                    .service(create_product)
                    .service(update_product)
                    .service(deactivate_product),
            ),
        )
        .await;
        actix_test::call_service(&app, request.to_request()).await
    }

    #[actix_web::test]
    async fn listing_serialises_prices_as_numbers() {
        let mut ports = MockPorts::default();
        ports
            .products_query
            .expect_list()
            .return_once(|| Ok(vec![product("Mug", "12.50", 3)]));

        let res = call(ports, actix_test::TestRequest::get().uri("/products")).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body[0]["name"], "Mug");
        assert_eq!(body[0]["price"], json!(12.5));
        assert_eq!(body[0]["isActive"], true);
    }

    #[actix_web::test]
    async fn malformed_product_id_is_bad_request() {
        let res = call(
            MockPorts::default(),
            actix_test::TestRequest::get().uri("/products/not-a-uuid"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], "invalid_uuid");
    }

    #[actix_web::test]
    async fn missing_product_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .products_query
            .expect_get()
            .return_once(|_| Err(Error::not_found("Product not found")));

        let res = call(
            ports,
            actix_test::TestRequest::get().uri(&format!("/products/{}", Uuid::new_v4())),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn admin_creates_product() {
        let mut ports = MockPorts::default().signed_in_as(caller(UserRole::Admin));
        ports
            .products
            .expect_create()
            .withf(|actor, draft| actor.is_admin() && draft.name == "Mug" && draft.stock == 4)
            .return_once(|_, draft| Ok(draft.into_product(Utc::now())));

        let res = call(
            ports,
            actix_test::TestRequest::post()
                .uri("/products")
                .insert_header(BEARER)
                .set_json(json!({"name": "Mug", "price": 9.99, "stock": 4})),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["price"], json!(9.99));
    }

    #[rstest]
    #[case(json!({"price": 1, "stock": 1}), "name")]
    #[case(json!({"name": "Mug", "stock": 1}), "price")]
    #[case(json!({"name": "Mug", "price": -1, "stock": 1}), "price")]
    #[case(json!({"name": "Mug", "price": 1.234, "stock": 1}), "price")]
    #[case(json!({"name": "Mug", "price": 10_000_000_000.0, "stock": 1}), "price")]
    #[case(json!({"name": "Mug", "price": 5e28, "stock": 1}), "price")]
    #[case(json!({"name": "Mug", "price": 1, "stock": 1.5}), "stock")]
    #[case(json!({"name": "Mug", "price": 1, "stock": -2}), "stock")]
    #[actix_web::test]
    async fn create_validates_fields(#[case] payload: Value, #[case] field: &str) {
        let ports = MockPorts::default().signed_in_as(caller(UserRole::Admin));

        let res = call(
            ports,
            actix_test::TestRequest::post()
                .uri("/products")
                .insert_header(BEARER)
                .set_json(payload),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], field);
    }

    #[actix_web::test]
    async fn customer_update_is_forbidden() {
        let mut ports = MockPorts::default().signed_in_as(caller(UserRole::Customer));
        ports
            .products
            .expect_update()
            .return_once(|_, _, _| Err(Error::forbidden("Admin access required")));

        let res = call(
            ports,
            actix_test::TestRequest::patch()
                .uri(&format!("/products/{}", Uuid::new_v4()))
                .insert_header(BEARER)
                .set_json(json!({"isActive": false})),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn delete_returns_the_deactivated_product() {
        let mut ports = MockPorts::default().signed_in_as(caller(UserRole::Admin));
        ports.products.expect_deactivate().return_once(|_, _| {
            let mut retired = product("Mug", "5", 0);
            retired.is_active = false;
            Ok(retired)
        });

        let res = call(
            ports,
            actix_test::TestRequest::delete()
                .uri(&format!("/products/{}", Uuid::new_v4()))
                .insert_header(BEARER),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["isActive"], false);
    }
}
