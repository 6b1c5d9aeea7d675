use serde::Serialize;

use storefront_domain::money::Money;

use crate::domain::types::OrderItem;
use crate::error::OrdersServiceError;

/// Shipping and tax rules applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Subtotals at or above this ship for free.
    pub free_shipping_threshold: Money,
    pub flat_shipping_fee: Money,
    /// Tax rate in basis points (1000 = 10%).
    pub tax_rate_bps: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money(10_000),
            flat_shipping_fee: Money(1_000),
            tax_rate_bps: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl PricingPolicy {
    /// Fails with `AmountOutOfRange` if any figure leaves the `i64` range.
    pub fn totals(&self, items: &[OrderItem]) -> Result<OrderTotals, OrdersServiceError> {
        let subtotal = items
            .iter()
            .try_fold(Money::ZERO, |acc, item| {
                item.price_at_purchase
                    .checked_times(item.quantity)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or(OrdersServiceError::AmountOutOfRange)?;
        self.totals_for_subtotal(subtotal)
    }

    pub fn totals_for_subtotal(&self, subtotal: Money) -> Result<OrderTotals, OrdersServiceError> {
        let shipping = if subtotal >= self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_shipping_fee
        };
        let tax = subtotal
            .basis_points(self.tax_rate_bps)
            .ok_or(OrdersServiceError::AmountOutOfRange)?;
        let total = Money::checked_sum([subtotal, shipping, tax])
            .ok_or(OrdersServiceError::AmountOutOfRange)?;
        Ok(OrderTotals {
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}
