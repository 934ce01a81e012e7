//! HTTP inbound adapter exposing the storefront REST endpoints.

use actix_web::web;

pub mod auth;
pub mod bearer;
pub mod cart;
pub mod error;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
pub use state::HttpState;

/// Register the JSON extractor settings and every API route.
///
/// Callers provide [`HttpState`] (and [`health::HealthState`] for the health endpoints)
/// as `web::Data`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use storefront::inbound::http::configure;
///
/// let _app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::json_config())
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::refresh)
                .service(auth::logout),
        )
        .service(
            web::scope("/cart")
                .service(cart::get_cart)
                .service(cart::clear_cart)
                .service(cart::add_item)
                .service(cart::update_item)
                .service(cart::remove_item)
                .service(cart::merge_cart),
        )
        .service(
            web::scope("/products")
                .service(products::list_products)
                .service(products::create_product)
                .service(products::get_product)
                .service(products::update_product)
                .service(products::deactivate_product),
        )
        .service(
            web::scope("/orders")
                .service(orders::checkout)
                .service(orders::list_orders)
                .service(orders::get_order)
                .service(orders::cancel_order)
                .service(payments::pay_order)
                .service(payments::list_payments),
        );
}
