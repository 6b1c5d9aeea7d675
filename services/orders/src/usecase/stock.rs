use std::collections::{HashMap, HashSet};

use storefront_domain::id::ProductId;

use crate::domain::repository::ProductRepository;
use crate::domain::types::{LineItem, Product, StockCheck, StockShortfall};
use crate::error::OrdersServiceError;

/// Products keyed by id, as read in one batch.
pub type ProductSnapshot = HashMap<ProductId, Product>;

/// Check every line against a product snapshot. Deleted products count as
/// zero available.
pub fn find_shortfalls(items: &[LineItem], products: &ProductSnapshot) -> Vec<StockShortfall> {
    items
        .iter()
        .filter_map(|item| match products.get(&item.product_id) {
            Some(product) if product.stock_quantity >= item.quantity => None,
            Some(product) => Some(StockShortfall {
                product_id: item.product_id,
                product_name: Some(product.name.clone()),
                requested: item.quantity,
                available: product.stock_quantity,
            }),
            None => Some(StockShortfall {
                product_id: item.product_id,
                product_name: None,
                requested: item.quantity,
                available: 0,
            }),
        })
        .collect()
}

/// Read all referenced products in one query and check availability.
///
/// Returns the snapshot as well so callers can price from the same read.
/// Storage errors become `InventoryUnavailable`.
pub async fn verify_stock<P: ProductRepository>(
    products: &P,
    items: &[LineItem],
) -> Result<(StockCheck, ProductSnapshot), OrdersServiceError> {
    if items.is_empty() {
        return Ok((StockCheck::Available, HashMap::new()));
    }

    let mut seen = HashSet::with_capacity(items.len());
    let ids: Vec<ProductId> = items
        .iter()
        .map(|item| item.product_id)
        .filter(|id| seen.insert(*id))
        .collect();

    let snapshot: ProductSnapshot = products
        .find_by_ids(&ids)
        .await
        .map_err(OrdersServiceError::into_inventory_unavailable)?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let shortfalls = find_shortfalls(items, &snapshot);
    let check = if shortfalls.is_empty() {
        StockCheck::Available
    } else {
        StockCheck::Shortfall(shortfalls)
    };
    Ok((check, snapshot))
}

// ── VerifyStock ──────────────────────────────────────────────────────────────

pub struct VerifyStockUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> VerifyStockUseCase<P> {
    pub async fn execute(&self, items: &[LineItem]) -> Result<StockCheck, OrdersServiceError> {
        let (check, _) = verify_stock(&self.products, items).await?;
        Ok(check)
    }
}
