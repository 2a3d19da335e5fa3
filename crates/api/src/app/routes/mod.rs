use axum::{
    Router,
    routing::{get, post, put},
};

pub mod notifications;
pub mod orders;
pub mod products;
pub mod system;

/// Router for the stock endpoints (mounted under `/stock`).
pub fn router() -> Router {
    Router::new()
        .route("/products", get(products::list_products).post(products::add_stock))
        .route(
            "/products/:name",
            get(products::get_product).delete(products::remove_product),
        )
        .route("/products/:name/availability", get(products::check_availability))
        .route("/products/:name/quantity", put(products::set_quantity))
        .route("/orders", post(orders::place_order))
        .route(
            "/notifications",
            get(notifications::list_notifications).delete(notifications::clear_notifications),
        )
}
