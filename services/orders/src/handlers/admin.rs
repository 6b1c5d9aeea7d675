use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use storefront_auth_types::identity::IdentityHeaders;
use storefront_domain::id::OrderId;
use storefront_domain::money::Money;
use storefront_domain::pagination::PageRequest;

use crate::domain::types::{FulfillmentUpdate, OrderStatus, PaymentStatus, ProductSales};
use crate::error::OrdersServiceError;
use crate::handlers::order::OrderResponse;
use crate::state::AppState;
use crate::usecase::order::{
    AdminDashboardUseCase, ListOrdersUseCase, UpdateFulfillmentUseCase, UpdateOrderStatusUseCase,
};

fn require_admin(identity: &IdentityHeaders) -> Result<(), OrdersServiceError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(OrdersServiceError::Forbidden)
    }
}

// ── GET /admin/dashboard ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DashboardResponse {
    /// Sum over every order regardless of status.
    pub total_revenue: Money,
    pub order_count: u64,
    pub pending_count: u64,
    pub top_products: Vec<ProductSales>,
    pub recent_orders: Vec<OrderResponse>,
}

pub async fn get_dashboard(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, OrdersServiceError> {
    require_admin(&identity)?;
    let usecase = AdminDashboardUseCase {
        repo: state.order_repo(),
    };
    let view = usecase.execute().await?;
    Ok(Json(DashboardResponse {
        total_revenue: view.stats.total_revenue,
        order_count: view.stats.order_count,
        pending_count: view.stats.pending_count,
        top_products: view.stats.top_products,
        recent_orders: view.recent_orders.into_iter().map(Into::into).collect(),
    }))
}

// ── GET /admin/orders ────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AdminOrdersQuery {
    pub status: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

pub async fn list_orders(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Query(query): Query<AdminOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, OrdersServiceError> {
    require_admin(&identity)?;
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(OrderStatus::parse(s).ok_or(OrdersServiceError::InvalidStatus)?),
    };
    let page = PageRequest::from_query(query.per_page, query.page);

    let usecase = ListOrdersUseCase {
        repo: state.order_repo(),
    };
    let orders = usecase.execute(status, page).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

// ── PATCH /admin/orders/{id}/status ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_order_status(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, OrdersServiceError> {
    require_admin(&identity)?;
    let next = OrderStatus::parse(body.status.trim()).ok_or(OrdersServiceError::InvalidStatus)?;
    let usecase = UpdateOrderStatusUseCase {
        repo: state.order_repo(),
    };
    let order = usecase.execute(order_id, next).await?;
    Ok(Json(order.into()))
}

// ── PATCH /admin/orders/{id} ─────────────────────────────────────────────────

/// Absent fields are left unchanged; an empty string clears
/// `tracking_number` / `notes`.
#[derive(Deserialize)]
pub struct UpdateFulfillmentRequest {
    pub payment_status: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

pub async fn update_fulfillment(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<UpdateFulfillmentRequest>,
) -> Result<Json<OrderResponse>, OrdersServiceError> {
    require_admin(&identity)?;
    let payment_status = body
        .payment_status
        .as_deref()
        .map(|s| PaymentStatus::parse(s.trim()).ok_or(OrdersServiceError::InvalidPaymentStatus))
        .transpose()?;
    let update = FulfillmentUpdate {
        payment_status,
        tracking_number: body.tracking_number.map(Some),
        notes: body.notes.map(Some),
    };

    let usecase = UpdateFulfillmentUseCase {
        repo: state.order_repo(),
    };
    let order = usecase.execute(order_id, update).await?;
    Ok(Json(order.into()))
}
