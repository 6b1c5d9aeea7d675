use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use storefront_auth_types::identity::IdentityHeaders;
use storefront_domain::id::ProductId;
use storefront_domain::money::Money;

use crate::domain::types::{NewProduct, Product, ProductUpdate};
use crate::error::OrdersServiceError;
use crate::handlers::PageQuery;
use crate::state::AppState;
use crate::usecase::product::{
    CreateProductUseCase, GetProductUseCase, ListProductsUseCase, SetStockUseCase,
    UpdateProductUseCase,
};

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
    pub in_stock: bool,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "storefront_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            slug: product.slug,
            description: product.description,
            price: product.price,
            stock_quantity: product.stock_quantity,
            in_stock: product.stock_quantity > 0,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// ── GET /products ────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ProductResponse>>, OrdersServiceError> {
    let usecase = ListProductsUseCase {
        repo: state.product_repo(),
    };
    let products = usecase.execute(query.page_request()).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

// ── GET /products/{id} ───────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>, OrdersServiceError> {
    let usecase = GetProductUseCase {
        repo: state.product_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── POST /products (admin) ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub stock_quantity: u32,
}

pub async fn create_product(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), OrdersServiceError> {
    if !identity.is_admin() {
        return Err(OrdersServiceError::Forbidden);
    }
    let usecase = CreateProductUseCase {
        repo: state.product_repo(),
    };
    let product = usecase
        .execute(NewProduct {
            name: body.name,
            slug: body.slug,
            description: body.description,
            price: body.price,
            stock_quantity: body.stock_quantity,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

// ── PATCH /products/{id} (admin) ─────────────────────────────────────────────

/// Absent fields are left unchanged; an empty `description` clears it.
#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock_quantity: Option<u32>,
}

pub async fn update_product(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, OrdersServiceError> {
    if !identity.is_admin() {
        return Err(OrdersServiceError::Forbidden);
    }
    let usecase = UpdateProductUseCase {
        repo: state.product_repo(),
    };
    let product = usecase
        .execute(
            id,
            ProductUpdate {
                name: body.name,
                slug: body.slug,
                description: body.description.map(Some),
                price: body.price,
                stock_quantity: body.stock_quantity,
            },
        )
        .await?;
    Ok(Json(product.into()))
}

// ── PUT /products/{id}/stock (admin) ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetStockRequest {
    pub stock_quantity: u32,
}

pub async fn set_stock(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<SetStockRequest>,
) -> Result<StatusCode, OrdersServiceError> {
    if !identity.is_admin() {
        return Err(OrdersServiceError::Forbidden);
    }
    let usecase = SetStockUseCase {
        repo: state.product_repo(),
    };
    usecase.execute(id, body.stock_quantity).await?;
    Ok(StatusCode::NO_CONTENT)
}
