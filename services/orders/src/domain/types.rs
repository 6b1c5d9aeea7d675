use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use storefront_domain::id::{CartItemId, OrderId, ProductId, UserId};
use storefront_domain::money::Money;

/// Catalog product with its live stock counter.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin input for a new catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
}

/// Admin edit of a catalog product. `None` leaves a field unchanged;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Money>,
    pub stock_quantity: Option<u32>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock_quantity.is_none()
    }
}

/// A line in a user's cart. `product_id` may dangle if the product was deleted.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line joined with its product; `product` is `None` when the product no longer exists.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Option<Product>,
}

impl CartLine {
    pub fn is_available(&self) -> bool {
        self.product.is_some()
    }
}

/// Requested `(product, quantity)` pair entering the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineItem {
    /// Collapse repeated products into one line, summing quantities.
    /// Lines keep the position of the product's first occurrence.
    pub fn merge(items: &[LineItem]) -> Vec<LineItem> {
        let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
        let mut positions: HashMap<ProductId, usize> = HashMap::new();
        for item in items {
            match positions.get(&item.product_id) {
                Some(&idx) => merged[idx].quantity += item.quantity,
                None => {
                    positions.insert(item.product_id, merged.len());
                    merged.push(*item);
                }
            }
        }
        merged
    }
}

impl From<&CartItem> for LineItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

/// A cart line that cannot be fulfilled from current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortfall {
    pub product_id: ProductId,
    /// `None` when the product no longer exists.
    pub product_name: Option<String>,
    pub requested: u32,
    pub available: u32,
}

impl fmt::Display for StockShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.product_name {
            Some(name) => write!(
                f,
                "{name} (requested: {}, available: {})",
                self.requested, self.available
            ),
            None => write!(f, "unknown product {}", self.product_id),
        }
    }
}

/// Outcome of checking a cart against inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockCheck {
    Available,
    Shortfall(Vec<StockShortfall>),
}

/// Order lifecycle: `pending -> processing -> shipped -> delivered`,
/// with `cancelled` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Shipped => 2,
            Self::Delivered => 3,
            Self::Cancelled => u8::MAX,
        }
    }

    /// Forward moves (skips allowed) and cancellation of non-terminal orders.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid)
                | (Self::Pending, Self::Failed)
                | (Self::Failed, Self::Pending)
                | (Self::Failed, Self::Paid)
                | (Self::Paid, Self::Refunded)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mpesa,
    Paypal,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mpesa" => Some(Self::Mpesa),
            "paypal" => Some(Self::Paypal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mpesa => "mpesa",
            Self::Paypal => "paypal",
        }
    }
}

/// A confirmed purchase together with its line items.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// Immutable order line; `price_at_purchase` is the unit price when the order was placed.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_purchase: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.price_at_purchase.times(self.quantity)
    }
}

/// Admin edits that do not touch the order status.
///
/// `Some(None)` clears an optional column; `None` leaves it unchanged.
#[derive(Debug, Clone, Default)]
pub struct FulfillmentUpdate {
    pub payment_status: Option<PaymentStatus>,
    pub tracking_number: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl FulfillmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.payment_status.is_none() && self.tracking_number.is_none() && self.notes.is_none()
    }
}

/// Units of one product sold across all orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    /// `None` when the product no longer exists.
    pub product_name: Option<String>,
    pub units_sold: u64,
}

/// Store-wide order aggregates for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStats {
    /// Sum of `total_amount` over every order.
    pub total_revenue: Money,
    pub order_count: u64,
    pub pending_count: u64,
    /// Best sellers by units, highest first.
    pub top_products: Vec<ProductSales>,
}

/// Shipping form fields collected at checkout.
#[derive(Debug, Clone, Default)]
pub struct ShippingDetails {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingDetails {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Free-text address stored on the order. Blank lines are skipped.
    pub fn to_address_text(&self) -> String {
        let locality = [self.city.trim(), self.postal_code.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let phone = format!("Phone: {}", self.phone.trim());
        [
            self.full_name.trim(),
            self.address.trim(),
            locality.as_str(),
            self.country.trim(),
            phone.as_str(),
        ]
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }
}
