use sea_orm::DatabaseConnection;

use storefront_core::health::ReadinessCheck;

use crate::domain::pricing::PricingPolicy;
use crate::infra::db::{DbCartRepository, DbOrderRepository, DbPlaceOrderPort, DbProductRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub pricing: PricingPolicy,
    /// Mark new orders paid at checkout (no payment provider is called).
    pub capture_payment: bool,
}

impl AppState {
    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: self.db.clone(),
        }
    }

    pub fn cart_repo(&self) -> DbCartRepository {
        DbCartRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }

    pub fn place_order_port(&self) -> DbPlaceOrderPort {
        DbPlaceOrderPort {
            db: self.db.clone(),
        }
    }
}

impl ReadinessCheck for AppState {
    async fn is_ready(&self) -> bool {
        self.db.ping().await.is_ok()
    }
}
