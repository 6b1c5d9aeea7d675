use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use storefront_core::health::{healthz, readyz};
use storefront_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    admin::{get_dashboard, list_orders, update_fulfillment, update_order_status},
    cart::{
        add_cart_item, check_cart_stock, count_cart, get_cart, remove_cart_item, update_cart_item,
    },
    order::{checkout, get_order, get_orders},
    product::{create_product, get_product, list_products, set_stock, update_product},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<AppState>))
        // Catalog
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).patch(update_product))
        .route("/products/{id}/stock", put(set_stock))
        // Cart
        .route("/cart", get(get_cart))
        .route("/cart/count", get(count_cart))
        .route("/cart/items", post(add_cart_item))
        .route(
            "/cart/items/{id}",
            patch(update_cart_item).delete(remove_cart_item),
        )
        .route("/cart/stock-check", post(check_cart_stock))
        // Orders
        .route("/orders", get(get_orders).post(checkout))
        .route("/orders/{id}", get(get_order))
        // Admin
        .route("/admin/dashboard", get(get_dashboard))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{id}", patch(update_fulfillment))
        .route("/admin/orders/{id}/status", patch(update_order_status))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
