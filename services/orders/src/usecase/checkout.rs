use chrono::Utc;
use uuid::Uuid;

use storefront_domain::id::{OrderId, UserId};
use storefront_domain::money::Money;

use crate::domain::pricing::{OrderTotals, PricingPolicy};
use crate::domain::repository::{CartRepository, PlaceOrderPort, PlaceOutcome, ProductRepository};
use crate::domain::types::{
    LineItem, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, StockCheck,
};
use crate::error::OrdersServiceError;
use crate::usecase::stock::{ProductSnapshot, verify_stock};

pub struct PlaceOrderInput {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    /// Total the client displayed; rejected if it no longer matches server prices.
    pub expected_total: Option<Money>,
}

#[derive(Debug)]
pub struct PlaceOrderOutput {
    pub order: Order,
    pub totals: OrderTotals,
    /// `false` when the order committed but the cart could not be emptied.
    pub cart_cleared: bool,
}

/// The caller's cart as checkout lines. Storage errors are reported as
/// `InventoryUnavailable` so the client can retry.
pub async fn cart_line_items<C: CartRepository>(
    carts: &C,
    user_id: UserId,
) -> Result<Vec<LineItem>, OrdersServiceError> {
    let items = carts
        .list(user_id)
        .await
        .map_err(OrdersServiceError::into_inventory_unavailable)?;
    Ok(items.iter().map(LineItem::from).collect())
}

/// Build the order with unit prices taken from the product snapshot.
///
/// Every line must already be present in `snapshot` (i.e. verified).
pub fn price_order(
    user_id: UserId,
    items: &[LineItem],
    snapshot: &ProductSnapshot,
    shipping_address: String,
    payment_method: PaymentMethod,
    capture_payment: bool,
) -> Result<Order, OrdersServiceError> {
    let now = Utc::now();
    let order_id = OrderId::generate();
    let order_items = items
        .iter()
        .map(|item| {
            let product = snapshot
                .get(&item.product_id)
                .ok_or(OrdersServiceError::ProductNotFound)?;
            Ok(OrderItem {
                id: Uuid::now_v7(),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price_at_purchase: product.price,
                created_at: now,
            })
        })
        .collect::<Result<Vec<_>, OrdersServiceError>>()?;

    let (status, payment_status) = if capture_payment {
        (OrderStatus::Processing, PaymentStatus::Paid)
    } else {
        (OrderStatus::Pending, PaymentStatus::Pending)
    };

    Ok(Order {
        id: order_id,
        user_id,
        status,
        total_amount: Money::ZERO,
        shipping_address,
        payment_method,
        payment_status,
        tracking_number: None,
        notes: None,
        created_at: now,
        updated_at: now,
        items: order_items,
    })
}

// ── PlaceOrder ───────────────────────────────────────────────────────────────

/// Verify stock, commit order + items + stock decrements atomically, then
/// clear the cart on a best-effort basis.
pub struct PlaceOrderUseCase<P, W, C>
where
    P: ProductRepository,
    W: PlaceOrderPort,
    C: CartRepository,
{
    pub products: P,
    pub orders: W,
    pub carts: C,
    pub pricing: PricingPolicy,
    /// Mocked synchronous payment: orders start as `processing` / `paid`.
    pub capture_payment: bool,
}

impl<P, W, C> PlaceOrderUseCase<P, W, C>
where
    P: ProductRepository,
    W: PlaceOrderPort,
    C: CartRepository,
{
    pub async fn execute(
        &self,
        input: PlaceOrderInput,
    ) -> Result<PlaceOrderOutput, OrdersServiceError> {
        if input.shipping_address.trim().is_empty() {
            return Err(OrdersServiceError::MissingFields(vec!["shipping_address"]));
        }
        if input.items.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }
        if input.items.iter().any(|item| item.quantity == 0) {
            return Err(OrdersServiceError::InvalidQuantity);
        }
        let items = LineItem::merge(&input.items);

        let (check, snapshot) = verify_stock(&self.products, &items).await?;
        if let StockCheck::Shortfall(shortfalls) = check {
            tracing::warn!(
                user_id = %input.user_id,
                shortfalls = shortfalls.len(),
                "checkout rejected: insufficient stock"
            );
            return Err(OrdersServiceError::StockShortfall(shortfalls));
        }

        let mut order = price_order(
            input.user_id,
            &items,
            &snapshot,
            input.shipping_address,
            input.payment_method,
            self.capture_payment,
        )?;
        let totals = self.pricing.totals(&order.items)?;
        if let Some(expected) = input.expected_total {
            if expected != totals.total {
                return Err(OrdersServiceError::TotalMismatch {
                    expected,
                    actual: totals.total,
                });
            }
        }
        order.total_amount = totals.total;

        match self
            .orders
            .place(&order)
            .await
            .map_err(OrdersServiceError::into_persistence_failed)?
        {
            PlaceOutcome::Committed => {}
            PlaceOutcome::Shortfall(shortfalls) => {
                tracing::warn!(
                    user_id = %order.user_id,
                    shortfalls = shortfalls.len(),
                    "checkout lost stock race; transaction rolled back"
                );
                return Err(OrdersServiceError::StockShortfall(shortfalls));
            }
            PlaceOutcome::PriceChanged(product_ids) => {
                tracing::warn!(
                    user_id = %order.user_id,
                    products = ?product_ids,
                    "price changed during checkout; transaction rolled back"
                );
                return Err(OrdersServiceError::PriceChanged(product_ids));
            }
        }

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total_amount,
            items = order.items.len(),
            "order placed"
        );

        let cart_cleared = match self.carts.clear(order.user_id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    order_id = %order.id,
                    user_id = %order.user_id,
                    error = ?e,
                    kind = "STALE_CART_CLEAR_FAILURE",
                    "order committed but cart was not cleared"
                );
                false
            }
        };

        Ok(PlaceOrderOutput {
            order,
            totals,
            cart_cleared,
        })
    }
}
