use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use storefront_domain::id::{CartItemId, OrderId, ProductId, UserId};
use storefront_domain::money::Money;
use storefront_domain::pagination::PageRequest;
use storefront_orders::domain::pricing::PricingPolicy;
use storefront_orders::domain::repository::{
    CartRepository, OrderRepository, PlaceOrderPort, PlaceOutcome, ProductRepository,
};
use storefront_orders::domain::types::{
    CartItem, FulfillmentUpdate, LineItem, NewProduct, Order, OrderStats, OrderStatus,
    PaymentMethod, Product, ProductSales, ProductUpdate, StockShortfall,
};
use storefront_orders::error::OrdersServiceError;
use storefront_orders::usecase::checkout::{PlaceOrderInput, PlaceOrderUseCase};

// ── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StoreState {
    pub products: HashMap<ProductId, Product>,
    pub carts: Vec<CartItem>,
    pub orders: Vec<Order>,
    pub fail_product_reads: bool,
    pub fail_cart_reads: bool,
    pub fail_order_writes: bool,
    pub fail_cart_clear: bool,
    /// Units removed from a product right after the next stock read, as if
    /// another checkout committed in between.
    pub steal_after_read: Option<(ProductId, u32)>,
    /// New price applied right after the next stock read, as if an admin
    /// edited the product mid-checkout.
    pub reprice_after_read: Option<(ProductId, i64)>,
}

/// In-memory implementation of every storage port. A single mutex makes
/// `place` atomic, mirroring the database transaction.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn with_products(products: &[(i32, &str, i64, u32)]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for &(id, name, price, stock) in products {
                state.products.insert(ProductId(id), test_product(id, name, price, stock));
            }
        }
        store
    }

    pub fn stock_of(&self, id: i32) -> u32 {
        self.state.lock().unwrap().products[&ProductId(id)].stock_quantity
    }

    pub fn set_price(&self, id: i32, price: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(product) = state.products.get_mut(&ProductId(id)) {
            product.price = Money(price);
        }
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn cart_len(&self, user_id: UserId) -> usize {
        self.state
            .lock()
            .unwrap()
            .carts
            .iter()
            .filter(|item| item.user_id == user_id)
            .count()
    }

    pub fn configure(&self, f: impl FnOnce(&mut StoreState)) {
        f(&mut self.state.lock().unwrap());
    }
}

fn storage_error(what: &str) -> OrdersServiceError {
    anyhow::anyhow!("{what}: connection reset by peer").into()
}

impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, OrdersServiceError> {
        Ok(self.state.lock().unwrap().products.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, OrdersServiceError> {
        let found = {
            let mut state = self.state.lock().unwrap();
            if state.fail_product_reads {
                return Err(storage_error("find products by ids"));
            }
            let found: Vec<Product> = ids
                .iter()
                .filter_map(|id| state.products.get(id).cloned())
                .collect();
            if let Some((id, units)) = state.steal_after_read.take() {
                if let Some(product) = state.products.get_mut(&id) {
                    product.stock_quantity = product.stock_quantity.saturating_sub(units);
                }
            }
            if let Some((id, price)) = state.reprice_after_read.take() {
                if let Some(product) = state.products.get_mut(&id) {
                    product.price = Money(price);
                }
            }
            found
        };
        // Let concurrent checkouts interleave between verification and commit.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn list(&self, _page: PageRequest) -> Result<Vec<Product>, OrdersServiceError> {
        Ok(self.state.lock().unwrap().products.values().cloned().collect())
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.products.values().any(|p| p.slug == product.slug) {
            return Err(OrdersServiceError::DuplicateSlug);
        }
        let id = state.products.len() as i32 + 1;
        let mut created = test_product(id, &product.name, product.price.0, product.stock_quantity);
        created.slug = product.slug.clone();
        state.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(slug) = &update.slug {
            if state.products.values().any(|p| p.id != id && &p.slug == slug) {
                return Err(OrdersServiceError::DuplicateSlug);
            }
        }
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            product.name = name.clone();
        }
        if let Some(slug) = &update.slug {
            product.slug = slug.clone();
        }
        if let Some(description) = &update.description {
            product.description = description.clone();
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(stock) = update.stock_quantity {
            product.stock_quantity = stock;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        amount: u32,
    ) -> Result<Option<u32>, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.products.get_mut(&id).and_then(|product| {
            (product.stock_quantity >= amount).then(|| {
                product.stock_quantity -= amount;
                product.stock_quantity
            })
        }))
    }

    async fn set_stock(&self, id: ProductId, quantity: u32) -> Result<bool, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .products
            .get_mut(&id)
            .map(|product| product.stock_quantity = quantity)
            .is_some())
    }
}

impl CartRepository for MemoryStore {
    async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, OrdersServiceError> {
        let state = self.state.lock().unwrap();
        if state.fail_cart_reads {
            return Err(storage_error("list cart items"));
        }
        Ok(state
            .carts
            .iter()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count(&self, user_id: UserId) -> Result<u64, OrdersServiceError> {
        Ok(self.cart_len(user_id) as u64)
    }

    async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state
            .carts
            .iter_mut()
            .find(|item| item.user_id == user_id && item.product_id == product_id)
        {
            item.quantity += quantity;
            return Ok(item.clone());
        }
        let item = CartItem {
            id: CartItemId::generate(),
            user_id,
            product_id,
            quantity,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.carts.push(item.clone());
        Ok(item)
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<bool, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .carts
            .iter_mut()
            .find(|item| item.id == item_id && item.user_id == user_id)
            .map(|item| item.quantity = quantity)
            .is_some())
    }

    async fn remove(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        let before = state.carts.len();
        state
            .carts
            .retain(|item| !(item.id == item_id && item.user_id == user_id));
        Ok(state.carts.len() < before)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_cart_clear {
            return Err(storage_error("clear cart"));
        }
        let before = state.carts.len();
        state.carts.retain(|item| item.user_id != user_id);
        Ok((before - state.carts.len()) as u64)
    }
}

impl OrderRepository for MemoryStore {
    async fn create_with_items(&self, order: &Order) -> Result<(), OrdersServiceError> {
        self.state.lock().unwrap().orders.push(order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrdersServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|order| order.id == id)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        _page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let mut orders: Vec<Order> = self
            .orders()
            .into_iter()
            .filter(|order| order.user_id == user_id)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list(
        &self,
        status: Option<OrderStatus>,
        _page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        Ok(self
            .orders()
            .into_iter()
            .filter(|order| status.is_none_or(|s| order.status == s))
            .collect())
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .orders
            .iter_mut()
            .find(|order| order.id == id && order.status == from)
            .map(|order| order.status = to)
            .is_some())
    }

    async fn update_fulfillment(
        &self,
        id: OrderId,
        update: &FulfillmentUpdate,
    ) -> Result<bool, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        let Some(order) = state.orders.iter_mut().find(|order| order.id == id) else {
            return Ok(false);
        };
        if let Some(status) = update.payment_status {
            order.payment_status = status;
        }
        if let Some(tracking) = &update.tracking_number {
            order.tracking_number = tracking.clone();
        }
        if let Some(notes) = &update.notes {
            order.notes = notes.clone();
        }
        Ok(true)
    }

    async fn stats(&self, top: u64) -> Result<OrderStats, OrdersServiceError> {
        let state = self.state.lock().unwrap();
        let mut units: HashMap<ProductId, u64> = HashMap::new();
        for item in state.orders.iter().flat_map(|order| &order.items) {
            *units.entry(item.product_id).or_default() += u64::from(item.quantity);
        }
        let mut top_products: Vec<ProductSales> = units
            .into_iter()
            .map(|(product_id, units_sold)| ProductSales {
                product_id,
                product_name: state.products.get(&product_id).map(|p| p.name.clone()),
                units_sold,
            })
            .collect();
        top_products.sort_by(|a, b| {
            b.units_sold
                .cmp(&a.units_sold)
                .then(a.product_id.cmp(&b.product_id))
        });
        top_products.truncate(top as usize);
        Ok(OrderStats {
            total_revenue: Money::checked_sum(state.orders.iter().map(|o| o.total_amount))
                .ok_or(OrdersServiceError::AmountOutOfRange)?,
            order_count: state.orders.len() as u64,
            pending_count: state
                .orders
                .iter()
                .filter(|order| order.status == OrderStatus::Pending)
                .count() as u64,
            top_products,
        })
    }
}

impl PlaceOrderPort for MemoryStore {
    async fn place(&self, order: &Order) -> Result<PlaceOutcome, OrdersServiceError> {
        let mut state = self.state.lock().unwrap();
        let shortfalls: Vec<StockShortfall> = order
            .items
            .iter()
            .filter_map(|item| {
                let product = state.products.get(&item.product_id);
                let available = product.map_or(0, |p| p.stock_quantity);
                (available < item.quantity).then(|| StockShortfall {
                    product_id: item.product_id,
                    product_name: product.map(|p| p.name.clone()),
                    requested: item.quantity,
                    available,
                })
            })
            .collect();
        if !shortfalls.is_empty() {
            return Ok(PlaceOutcome::Shortfall(shortfalls));
        }
        let repriced: Vec<ProductId> = order
            .items
            .iter()
            .filter(|item| {
                state
                    .products
                    .get(&item.product_id)
                    .is_some_and(|p| p.price != item.price_at_purchase)
            })
            .map(|item| item.product_id)
            .collect();
        if !repriced.is_empty() {
            return Ok(PlaceOutcome::PriceChanged(repriced));
        }
        if state.fail_order_writes {
            return Err(storage_error("insert order items"));
        }
        for item in &order.items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.stock_quantity -= item.quantity;
            }
        }
        state.orders.push(order.clone());
        Ok(PlaceOutcome::Committed)
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub fn test_product(id: i32, name: &str, price: i64, stock: u32) -> Product {
    Product {
        id: ProductId(id),
        name: name.to_owned(),
        slug: name.to_lowercase().replace(' ', "-"),
        description: None,
        price: Money(price),
        stock_quantity: stock,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_user() -> UserId {
    UserId(Uuid::new_v4())
}

pub fn lines(items: &[(i32, u32)]) -> Vec<LineItem> {
    items
        .iter()
        .map(|&(product, quantity)| LineItem {
            product_id: ProductId(product),
            quantity,
        })
        .collect()
}

pub fn checkout_input(user_id: UserId, items: &[(i32, u32)]) -> PlaceOrderInput {
    PlaceOrderInput {
        user_id,
        items: lines(items),
        shipping_address: "Amina Otieno\n12 Moi Avenue\nNairobi\nPhone: +254700000000".to_owned(),
        payment_method: PaymentMethod::Mpesa,
        expected_total: None,
    }
}

pub type MemoryCheckout = PlaceOrderUseCase<MemoryStore, MemoryStore, MemoryStore>;

pub fn checkout_usecase(store: &MemoryStore) -> MemoryCheckout {
    PlaceOrderUseCase {
        products: store.clone(),
        orders: store.clone(),
        carts: store.clone(),
        pricing: PricingPolicy::default(),
        capture_payment: false,
    }
}
