use storefront_auth_types::identity::IdentityHeaders;
use storefront_domain::id::{OrderId, UserId};
use storefront_domain::pagination::PageRequest;

use crate::domain::repository::OrderRepository;
use crate::domain::types::{FulfillmentUpdate, Order, OrderStats, OrderStatus};
use crate::error::OrdersServiceError;

// ── GetOrder ─────────────────────────────────────────────────────────────────

pub struct GetOrderUseCase<R: OrderRepository> {
    pub repo: R,
}

impl<R: OrderRepository> GetOrderUseCase<R> {
    /// Orders belonging to someone else are reported as not found unless the
    /// caller is an admin.
    pub async fn execute(
        &self,
        caller: &IdentityHeaders,
        order_id: OrderId,
    ) -> Result<Order, OrdersServiceError> {
        let order = self
            .repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrdersServiceError::OrderNotFound)?;
        if order.user_id != caller.user_id && !caller.is_admin() {
            return Err(OrdersServiceError::OrderNotFound);
        }
        Ok(order)
    }
}

// ── GetOrders ────────────────────────────────────────────────────────────────

pub struct GetOrdersUseCase<R: OrderRepository> {
    pub repo: R,
}

impl<R: OrderRepository> GetOrdersUseCase<R> {
    pub async fn execute(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        self.repo.list_by_user(user_id, page.clamped()).await
    }
}

// ── ListOrders (admin) ───────────────────────────────────────────────────────

pub struct ListOrdersUseCase<R: OrderRepository> {
    pub repo: R,
}

impl<R: OrderRepository> ListOrdersUseCase<R> {
    pub async fn execute(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        self.repo.list(status, page.clamped()).await
    }
}

// ── UpdateOrderStatus (admin) ────────────────────────────────────────────────

pub struct UpdateOrderStatusUseCase<R: OrderRepository> {
    pub repo: R,
}

impl<R: OrderRepository> UpdateOrderStatusUseCase<R> {
    pub async fn execute(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut order = self
            .repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrdersServiceError::OrderNotFound)?;
        let current = order.status;
        if !current.can_transition_to(next) {
            return Err(OrdersServiceError::InvalidStatusTransition {
                from: current,
                to: next,
            });
        }
        if !self.repo.update_status(order_id, current, next).await? {
            return Err(OrdersServiceError::OrderStatusConflict);
        }
        tracing::info!(order_id = %order_id, from = %current, to = %next, "order status changed");
        order.status = next;
        Ok(order)
    }
}

// ── UpdateFulfillment (admin) ────────────────────────────────────────────────

pub struct UpdateFulfillmentUseCase<R: OrderRepository> {
    pub repo: R,
}

impl<R: OrderRepository> UpdateFulfillmentUseCase<R> {
    pub async fn execute(
        &self,
        order_id: OrderId,
        update: FulfillmentUpdate,
    ) -> Result<Order, OrdersServiceError> {
        if update.is_empty() {
            return Err(OrdersServiceError::MissingFields(vec![
                "payment_status",
                "tracking_number",
                "notes",
            ]));
        }
        let update = FulfillmentUpdate {
            payment_status: update.payment_status,
            tracking_number: update.tracking_number.map(blank_to_none),
            notes: update.notes.map(blank_to_none),
        };

        let order = self
            .repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrdersServiceError::OrderNotFound)?;
        if let Some(next) = update.payment_status {
            if next != order.payment_status && !order.payment_status.can_transition_to(next) {
                return Err(OrdersServiceError::InvalidPaymentStatusTransition {
                    from: order.payment_status,
                    to: next,
                });
            }
        }

        if !self.repo.update_fulfillment(order_id, &update).await? {
            return Err(OrdersServiceError::OrderNotFound);
        }
        self.repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrdersServiceError::OrderNotFound)
    }
}

// ── AdminDashboard ───────────────────────────────────────────────────────────

const DASHBOARD_RECENT_ORDERS: u32 = 5;
const DASHBOARD_TOP_PRODUCTS: u64 = 5;

#[derive(Debug)]
pub struct DashboardView {
    pub stats: OrderStats,
    /// Newest first.
    pub recent_orders: Vec<Order>,
}

pub struct AdminDashboardUseCase<R: OrderRepository> {
    pub repo: R,
}

impl<R: OrderRepository> AdminDashboardUseCase<R> {
    pub async fn execute(&self) -> Result<DashboardView, OrdersServiceError> {
        let stats = self.repo.stats(DASHBOARD_TOP_PRODUCTS).await?;
        let recent_orders = self
            .repo
            .list(
                None,
                PageRequest {
                    per_page: DASHBOARD_RECENT_ORDERS,
                    page: 1,
                },
            )
            .await?;
        Ok(DashboardView {
            stats,
            recent_orders,
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}
