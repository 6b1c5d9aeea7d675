use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_auth_types::identity::IdentityHeaders;
use storefront_domain::id::{OrderId, ProductId, UserId};
use storefront_domain::money::Money;

use crate::domain::pricing::OrderTotals;
use crate::domain::types::{
    Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingDetails,
};
use crate::error::OrdersServiceError;
use crate::handlers::PageQuery;
use crate::state::AppState;
use crate::usecase::checkout::{PlaceOrderInput, PlaceOrderUseCase, cart_line_items};
use crate::usecase::order::{GetOrderUseCase, GetOrdersUseCase};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_purchase: Money,
    pub line_total: Money,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            line_total: item.line_total(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            tracking_number: order.tracking_number,
            notes: order.notes,
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// ── POST /orders (checkout) ──────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CheckoutRequest {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub payment_method: String,
    /// Total shown to the customer; checkout is refused if prices moved.
    pub expected_total: Option<Money>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order: OrderResponse,
    pub totals: OrderTotals,
    pub cart_cleared: bool,
}

pub async fn checkout(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), OrdersServiceError> {
    let shipping = ShippingDetails {
        full_name: body.full_name,
        phone: body.phone,
        address: body.address,
        city: body.city,
        postal_code: body.postal_code,
        country: body.country,
    };
    let mut missing = shipping.missing_fields();
    if body.payment_method.trim().is_empty() {
        missing.push("payment_method");
    }
    if !missing.is_empty() {
        return Err(OrdersServiceError::MissingFields(missing));
    }
    let payment_method = PaymentMethod::parse(body.payment_method.trim())
        .ok_or(OrdersServiceError::InvalidPaymentMethod)?;

    let carts = state.cart_repo();
    let items = cart_line_items(&carts, identity.user_id).await?;

    let usecase = PlaceOrderUseCase {
        products: state.product_repo(),
        orders: state.place_order_port(),
        carts,
        pricing: state.pricing,
        capture_payment: state.capture_payment,
    };
    let out = usecase
        .execute(PlaceOrderInput {
            user_id: identity.user_id,
            items,
            shipping_address: shipping.to_address_text(),
            payment_method,
            expected_total: body.expected_total,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order: out.order.into(),
            totals: out.totals,
            cart_cleared: out.cart_cleared,
        }),
    ))
}

// ── GET /orders ──────────────────────────────────────────────────────────────

pub async fn get_orders(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<OrderResponse>>, OrdersServiceError> {
    let usecase = GetOrdersUseCase {
        repo: state.order_repo(),
    };
    let orders = usecase
        .execute(identity.user_id, query.page_request())
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

// ── GET /orders/{id} ─────────────────────────────────────────────────────────

pub async fn get_order(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>, OrdersServiceError> {
    let usecase = GetOrderUseCase {
        repo: state.order_repo(),
    };
    let order = usecase.execute(&identity, order_id).await?;
    Ok(Json(order.into()))
}
