use serde::Deserialize;

use storefront_core::config::Config;
use storefront_domain::money::Money;

use crate::domain::pricing::PricingPolicy;

/// Orders service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct OrdersConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3120). Env var: `ORDERS_PORT`.
    #[serde(default = "default_orders_port")]
    pub orders_port: u16,
    /// Treat payment as captured at checkout (default true). Env var: `CAPTURE_PAYMENT`.
    #[serde(default = "default_capture_payment")]
    pub capture_payment: bool,
    /// Minor units. Env var: `FREE_SHIPPING_THRESHOLD`.
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: i64,
    /// Minor units. Env var: `FLAT_SHIPPING_FEE`.
    #[serde(default = "default_flat_shipping_fee")]
    pub flat_shipping_fee: i64,
    /// Basis points (1000 = 10%). Env var: `TAX_RATE_BPS`.
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,
}

fn default_orders_port() -> u16 {
    3120
}

fn default_capture_payment() -> bool {
    true
}

fn default_free_shipping_threshold() -> i64 {
    PricingPolicy::default().free_shipping_threshold.minor_units()
}

fn default_flat_shipping_fee() -> i64 {
    PricingPolicy::default().flat_shipping_fee.minor_units()
}

fn default_tax_rate_bps() -> u32 {
    PricingPolicy::default().tax_rate_bps
}

impl Config for OrdersConfig {}

impl OrdersConfig {
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            free_shipping_threshold: Money(self.free_shipping_threshold),
            flat_shipping_fee: Money(self.flat_shipping_fee),
            tax_rate_bps: self.tax_rate_bps,
        }
    }
}
