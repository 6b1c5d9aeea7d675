#![allow(async_fn_in_trait)]

use storefront_domain::id::{CartItemId, OrderId, ProductId, UserId};
use storefront_domain::pagination::PageRequest;

use crate::domain::types::{
    CartItem, FulfillmentUpdate, NewProduct, Order, OrderStats, OrderStatus, Product,
    ProductUpdate, StockShortfall,
};
use crate::error::OrdersServiceError;

/// Catalog and inventory store.
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, OrdersServiceError>;

    /// Batched lookup. Missing ids are simply absent from the result.
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, OrdersServiceError>;

    async fn list(&self, page: PageRequest) -> Result<Vec<Product>, OrdersServiceError>;

    /// Fails with `DuplicateSlug` if another product already uses the slug.
    async fn create(&self, product: &NewProduct) -> Result<Product, OrdersServiceError>;

    /// Apply the set fields. Returns `None` if the product does not exist;
    /// fails with `DuplicateSlug` like `create`.
    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, OrdersServiceError>;

    /// Atomically subtract `amount` from the stock counter if enough units remain.
    /// Returns the new quantity, or `None` when the product is missing or short.
    async fn decrement_stock(
        &self,
        id: ProductId,
        amount: u32,
    ) -> Result<Option<u32>, OrdersServiceError>;

    /// Absolute stock set (admin tooling). Returns `false` if the product does not exist.
    async fn set_stock(&self, id: ProductId, quantity: u32) -> Result<bool, OrdersServiceError>;
}

/// Per-user cart store.
pub trait CartRepository: Send + Sync {
    async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, OrdersServiceError>;

    async fn count(&self, user_id: UserId) -> Result<u64, OrdersServiceError>;

    /// Add `quantity` units, incrementing an existing line for the same product.
    async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, OrdersServiceError>;

    /// Returns `false` if the line does not exist or belongs to another user.
    async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<bool, OrdersServiceError>;

    async fn remove(&self, user_id: UserId, item_id: CartItemId)
    -> Result<bool, OrdersServiceError>;

    /// Delete every line of the user's cart. Returns the number of rows removed.
    async fn clear(&self, user_id: UserId) -> Result<u64, OrdersServiceError>;
}

/// Append-only order store.
pub trait OrderRepository: Send + Sync {
    /// Insert the order row and all of its items in one transaction.
    async fn create_with_items(&self, order: &Order) -> Result<(), OrdersServiceError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrdersServiceError>;

    /// Newest first.
    async fn list_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    /// Admin listing, newest first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    /// Compare-and-set: applies only while the stored status still equals `from`.
    /// Returns `false` when no row matched.
    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, OrdersServiceError>;

    /// Returns `false` if the order does not exist.
    async fn update_fulfillment(
        &self,
        id: OrderId,
        update: &FulfillmentUpdate,
    ) -> Result<bool, OrdersServiceError>;

    /// Revenue and order counts over the whole store, plus the `top` best
    /// selling products by units.
    async fn stats(&self, top: u64) -> Result<OrderStats, OrdersServiceError>;
}

/// Result of committing a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    Committed,
    /// Stock moved between verification and commit; nothing was written.
    Shortfall(Vec<StockShortfall>),
    /// A unit price no longer matches `price_at_purchase`; nothing was written.
    PriceChanged(Vec<ProductId>),
}

/// Writes the order, its items, and the matching stock decrements as one unit.
///
/// Every item's `price_at_purchase` is compared with the product row locked
/// by its decrement, so the committed prices are the ones in effect at commit.
pub trait PlaceOrderPort: Send + Sync {
    async fn place(&self, order: &Order) -> Result<PlaceOutcome, OrdersServiceError>;
}
