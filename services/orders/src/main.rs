use sea_orm::Database;
use tracing::info;

use storefront_core::config::Config as _;
use storefront_core::tracing::init_tracing;
use storefront_orders::config::OrdersConfig;
use storefront_orders::router::build_router;
use storefront_orders::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing("info,sqlx=warn");

    let config = OrdersConfig::from_env().expect("invalid orders configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        pricing: config.pricing_policy(),
        capture_payment: config.capture_payment,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.orders_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!(capture_payment = config.capture_payment, "orders service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
