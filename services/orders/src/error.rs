use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use storefront_domain::id::ProductId;
use storefront_domain::money::Money;

use crate::domain::types::{OrderStatus, PaymentStatus, StockShortfall};

/// Orders service error variants.
#[derive(Debug, thiserror::Error)]
pub enum OrdersServiceError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("cart is empty")]
    EmptyCart,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("price must not be negative")]
    InvalidPrice,
    #[error("amount exceeds the supported range")]
    AmountOutOfRange,
    #[error("invalid order status")]
    InvalidStatus,
    #[error("invalid payment status")]
    InvalidPaymentStatus,
    #[error("invalid payment method")]
    InvalidPaymentMethod,
    #[error("forbidden")]
    Forbidden,
    #[error("product not found")]
    ProductNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("cart item not found")]
    CartItemNotFound,
    #[error("some items are out of stock: {}", format_shortfalls(.0))]
    StockShortfall(Vec<StockShortfall>),
    #[error("order total changed: expected {expected}, current total is {actual}")]
    TotalMismatch { expected: Money, actual: Money },
    #[error("cannot change order status from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },
    #[error("cannot change payment status from {from} to {to}")]
    InvalidPaymentStatusTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("order status was changed concurrently")]
    OrderStatusConflict,
    #[error("prices changed during checkout, please review your cart")]
    PriceChanged(Vec<ProductId>),
    #[error("a product with this slug already exists")]
    DuplicateSlug,
    #[error("inventory is temporarily unavailable, please try again")]
    InventoryUnavailable(#[source] anyhow::Error),
    #[error("order could not be placed, please try again")]
    OrderPersistenceFailed(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

fn format_shortfalls(shortfalls: &[StockShortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl OrdersServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::EmptyCart => "EMPTY_CART",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::InvalidPrice => "INVALID_PRICE",
            Self::AmountOutOfRange => "AMOUNT_OUT_OF_RANGE",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidPaymentStatus => "INVALID_PAYMENT_STATUS",
            Self::InvalidPaymentMethod => "INVALID_PAYMENT_METHOD",
            Self::Forbidden => "FORBIDDEN",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::StockShortfall(_) => "STOCK_SHORTFALL",
            Self::TotalMismatch { .. } => "TOTAL_MISMATCH",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::InvalidPaymentStatusTransition { .. } => "INVALID_PAYMENT_STATUS_TRANSITION",
            Self::OrderStatusConflict => "ORDER_STATUS_CONFLICT",
            Self::PriceChanged(_) => "PRICE_CHANGED",
            Self::DuplicateSlug => "DUPLICATE_SLUG",
            Self::InventoryUnavailable(_) => "INVENTORY_UNAVAILABLE",
            Self::OrderPersistenceFailed(_) => "ORDER_PERSISTENCE_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Storage failures while reading stock are retryable, not internal.
    pub fn into_inventory_unavailable(self) -> Self {
        match self {
            Self::Internal(e) => Self::InventoryUnavailable(e),
            other => other,
        }
    }

    /// Storage failures while writing an order abort the whole placement.
    pub fn into_persistence_failed(self) -> Self {
        match self {
            Self::Internal(e) => Self::OrderPersistenceFailed(e),
            other => other,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_)
            | Self::EmptyCart
            | Self::InvalidQuantity
            | Self::InvalidPrice
            | Self::AmountOutOfRange
            | Self::InvalidStatus
            | Self::InvalidPaymentStatus
            | Self::InvalidPaymentMethod => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ProductNotFound | Self::OrderNotFound | Self::CartItemNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::StockShortfall(_)
            | Self::TotalMismatch { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::InvalidPaymentStatusTransition { .. }
            | Self::OrderStatusConflict
            | Self::PriceChanged(_)
            | Self::DuplicateSlug => StatusCode::CONFLICT,
            Self::InventoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::OrderPersistenceFailed(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for OrdersServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::InventoryUnavailable(e) | Self::OrderPersistenceFailed(e) | Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), kind = self.kind(), "request failed");
            }
            _ => {}
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        match &self {
            Self::StockShortfall(shortfalls) => {
                body["shortfalls"] = serde_json::json!(shortfalls);
            }
            Self::PriceChanged(product_ids) => {
                body["product_ids"] = serde_json::json!(product_ids);
            }
            _ => {}
        }
        (status, axum::Json(body)).into_response()
    }
}
