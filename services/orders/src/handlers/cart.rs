use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use storefront_auth_types::identity::IdentityHeaders;
use storefront_domain::id::{CartItemId, ProductId};
use storefront_domain::money::Money;

use crate::domain::types::{CartItem, StockCheck, StockShortfall};
use crate::error::OrdersServiceError;
use crate::handlers::product::ProductResponse;
use crate::state::AppState;
use crate::usecase::cart::{
    AddToCartUseCase, CheckCartStockUseCase, CountCartUseCase, GetCartUseCase,
    RemoveCartItemUseCase, UpdateCartItemUseCase,
};

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            created_at: item.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct CartLineResponse {
    #[serde(flatten)]
    pub item: CartItemResponse,
    /// `None` when the product has been deleted.
    pub product: Option<ProductResponse>,
    pub available: bool,
    pub line_total: Option<Money>,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
    pub subtotal: Money,
}

// ── GET /cart ────────────────────────────────────────────────────────────────

pub async fn get_cart(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>, OrdersServiceError> {
    let usecase = GetCartUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let view = usecase.execute(identity.user_id).await?;
    let items = view
        .lines
        .into_iter()
        .map(|line| {
            let available = line.is_available();
            let line_total = line
                .product
                .as_ref()
                .map(|product| product.price.times(line.item.quantity));
            CartLineResponse {
                item: line.item.into(),
                product: line.product.map(Into::into),
                available,
                line_total,
            }
        })
        .collect();
    Ok(Json(CartResponse {
        items,
        subtotal: view.subtotal,
    }))
}

// ── GET /cart/count ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CartCountResponse {
    pub count: u64,
}

pub async fn count_cart(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<CartCountResponse>, OrdersServiceError> {
    let usecase = CountCartUseCase {
        carts: state.cart_repo(),
    };
    let count = usecase.execute(identity.user_id).await?;
    Ok(Json(CartCountResponse { count }))
}

// ── POST /cart/items ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

pub async fn add_cart_item(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartItemResponse>), OrdersServiceError> {
    let usecase = AddToCartUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let item = usecase
        .execute(identity.user_id, body.product_id, body.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

// ── PATCH /cart/items/{id} ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

pub async fn update_cart_item(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateCartItemRequest>,
) -> Result<StatusCode, OrdersServiceError> {
    let usecase = UpdateCartItemUseCase {
        carts: state.cart_repo(),
    };
    usecase
        .execute(identity.user_id, item_id, body.quantity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /cart/items/{id} ──────────────────────────────────────────────────

pub async fn remove_cart_item(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
) -> Result<StatusCode, OrdersServiceError> {
    let usecase = RemoveCartItemUseCase {
        carts: state.cart_repo(),
    };
    usecase.execute(identity.user_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /cart/stock-check ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StockCheckResponse {
    pub available: bool,
    pub shortfalls: Vec<StockShortfall>,
}

pub async fn check_cart_stock(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<StockCheckResponse>, OrdersServiceError> {
    let usecase = CheckCartStockUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let body = match usecase.execute(identity.user_id).await? {
        StockCheck::Available => StockCheckResponse {
            available: true,
            shortfalls: vec![],
        },
        StockCheck::Shortfall(shortfalls) => StockCheckResponse {
            available: false,
            shortfalls,
        },
    };
    Ok(Json(body))
}
