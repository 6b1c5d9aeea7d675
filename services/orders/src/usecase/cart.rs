use storefront_domain::id::{CartItemId, ProductId, UserId};
use storefront_domain::money::Money;

use crate::domain::repository::{CartRepository, ProductRepository};
use crate::domain::types::{CartItem, CartLine, LineItem, StockCheck};
use crate::error::OrdersServiceError;
use crate::usecase::stock::verify_stock;

#[derive(Debug)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    /// Sum over lines whose product still exists.
    pub subtotal: Money,
}

// ── GetCart ──────────────────────────────────────────────────────────────────

pub struct GetCartUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> GetCartUseCase<C, P> {
    pub async fn execute(&self, user_id: UserId) -> Result<CartView, OrdersServiceError> {
        let items = self.carts.list(user_id).await?;
        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let products = if ids.is_empty() {
            Vec::new()
        } else {
            self.products.find_by_ids(&ids).await?
        };

        let lines: Vec<CartLine> = items
            .into_iter()
            .map(|item| {
                let product = products.iter().find(|p| p.id == item.product_id).cloned();
                CartLine { item, product }
            })
            .collect();
        let subtotal = lines
            .iter()
            .filter_map(|line| {
                line.product
                    .as_ref()
                    .map(|product| product.price.checked_times(line.item.quantity))
            })
            .try_fold(Money::ZERO, |acc, line_total| {
                line_total.and_then(|amount| acc.checked_add(amount))
            })
            .ok_or(OrdersServiceError::AmountOutOfRange)?;
        Ok(CartView { lines, subtotal })
    }
}

// ── CountCart ────────────────────────────────────────────────────────────────

pub struct CountCartUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> CountCartUseCase<C> {
    pub async fn execute(&self, user_id: UserId) -> Result<u64, OrdersServiceError> {
        self.carts.count(user_id).await
    }
}

// ── AddToCart ────────────────────────────────────────────────────────────────

pub struct AddToCartUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> AddToCartUseCase<C, P> {
    pub async fn execute(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, OrdersServiceError> {
        if quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity);
        }
        if self.products.find_by_id(product_id).await?.is_none() {
            return Err(OrdersServiceError::ProductNotFound);
        }
        self.carts.add(user_id, product_id, quantity).await
    }
}

// ── UpdateCartItem ───────────────────────────────────────────────────────────

pub struct UpdateCartItemUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> UpdateCartItemUseCase<C> {
    pub async fn execute(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), OrdersServiceError> {
        if quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity);
        }
        if !self.carts.set_quantity(user_id, item_id, quantity).await? {
            return Err(OrdersServiceError::CartItemNotFound);
        }
        Ok(())
    }
}

// ── RemoveCartItem ───────────────────────────────────────────────────────────

pub struct RemoveCartItemUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> RemoveCartItemUseCase<C> {
    pub async fn execute(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), OrdersServiceError> {
        if !self.carts.remove(user_id, item_id).await? {
            return Err(OrdersServiceError::CartItemNotFound);
        }
        Ok(())
    }
}

// ── CheckCartStock ───────────────────────────────────────────────────────────

pub struct CheckCartStockUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> CheckCartStockUseCase<C, P> {
    pub async fn execute(&self, user_id: UserId) -> Result<StockCheck, OrdersServiceError> {
        let items: Vec<LineItem> = self
            .carts
            .list(user_id)
            .await?
            .iter()
            .map(LineItem::from)
            .collect();
        let (check, _) = verify_stock(&self.products, &items).await?;
        Ok(check)
    }
}
