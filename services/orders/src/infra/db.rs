use std::collections::HashMap;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr, TransactionError, TransactionTrait,
    sea_query::{Alias, Expr, OnConflict},
};
use uuid::Uuid;

use storefront_domain::id::{CartItemId, OrderId, ProductId, UserId};
use storefront_domain::money::Money;
use storefront_domain::pagination::PageRequest;
use storefront_orders_schema::{cart_items, order_items, orders, products};

use crate::domain::repository::{
    CartRepository, OrderRepository, PlaceOrderPort, PlaceOutcome, ProductRepository,
};
use crate::domain::types::{
    CartItem, FulfillmentUpdate, NewProduct, Order, OrderItem, OrderStats, OrderStatus,
    PaymentMethod, PaymentStatus, Product, ProductSales, ProductUpdate, StockShortfall,
};
use crate::error::OrdersServiceError;

/// Quantities are `u32` in the domain and `i32` in Postgres. Values past
/// `i32::MAX` saturate, which can never satisfy a stock check.
fn db_quantity(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

fn domain_quantity(quantity: i32) -> u32 {
    u32::try_from(quantity).unwrap_or(0)
}

// ── Shared statements ────────────────────────────────────────────────────────

/// `UPDATE products SET stock_quantity = stock_quantity - $n
///  WHERE id = $id AND stock_quantity >= $n RETURNING *`
///
/// Returns the updated row, or `None` if the row is missing or short.
async fn decrement_stock_on<C: ConnectionTrait>(
    conn: &C,
    id: ProductId,
    amount: u32,
) -> Result<Option<products::Model>, DbErr> {
    let amount = db_quantity(amount);
    let rows = products::Entity::update_many()
        .col_expr(
            products::Column::StockQuantity,
            Expr::col(products::Column::StockQuantity).sub(amount),
        )
        .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(products::Column::Id.eq(id.0))
        .filter(products::Column::StockQuantity.gte(amount))
        .exec_with_returning(conn)
        .await?;
    Ok(rows.into_iter().next())
}

async fn insert_order_on<C: ConnectionTrait>(conn: &C, order: &Order) -> Result<(), DbErr> {
    let row = orders::ActiveModel {
        id: Set(order.id.0),
        user_id: Set(order.user_id.0),
        status: Set(order.status.as_str().to_owned()),
        total_amount: Set(order.total_amount.minor_units()),
        shipping_address: Set(order.shipping_address.clone()),
        payment_method: Set(order.payment_method.as_str().to_owned()),
        payment_status: Set(order.payment_status.as_str().to_owned()),
        tracking_number: Set(order.tracking_number.clone()),
        notes: Set(order.notes.clone()),
        created_at: Set(order.created_at),
        updated_at: Set(order.updated_at),
    };
    orders::Entity::insert(row)
        .exec_without_returning(conn)
        .await?;

    if order.items.is_empty() {
        return Ok(());
    }
    let items = order.items.iter().map(|item| order_items::ActiveModel {
        id: Set(item.id),
        order_id: Set(item.order_id.0),
        product_id: Set(item.product_id.0),
        quantity: Set(db_quantity(item.quantity)),
        price_at_purchase: Set(item.price_at_purchase.minor_units()),
        created_at: Set(item.created_at),
    });
    order_items::Entity::insert_many(items)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

// ── Product repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProductRepository {
    pub db: DatabaseConnection,
}

impl ProductRepository for DbProductRepository {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, OrdersServiceError> {
        let model = products::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find product by id")?;
        Ok(model.map(product_from_model))
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, OrdersServiceError> {
        let models = products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().map(|id| id.0)))
            .all(&self.db)
            .await
            .context("find products by ids")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Product>, OrdersServiceError> {
        let models = products::Entity::find()
            .order_by_asc(products::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list products")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, OrdersServiceError> {
        let now = Utc::now();
        let model = products::ActiveModel {
            id: NotSet,
            name: Set(product.name.trim().to_owned()),
            slug: Set(product.slug.trim().to_owned()),
            description: Set(product.description.clone()),
            price: Set(product.price.minor_units()),
            stock_quantity: Set(db_quantity(product.stock_quantity)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| slug_conflict(e, "create product"))?;
        Ok(product_from_model(model))
    }

    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, OrdersServiceError> {
        let mut query = products::Entity::update_many()
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(id.0));
        if let Some(name) = &update.name {
            query = query.col_expr(products::Column::Name, Expr::value(name.clone()));
        }
        if let Some(slug) = &update.slug {
            query = query.col_expr(products::Column::Slug, Expr::value(slug.clone()));
        }
        if let Some(description) = &update.description {
            query = query.col_expr(
                products::Column::Description,
                Expr::value(description.clone()),
            );
        }
        if let Some(price) = update.price {
            query = query.col_expr(products::Column::Price, Expr::value(price.minor_units()));
        }
        if let Some(stock) = update.stock_quantity {
            query = query.col_expr(
                products::Column::StockQuantity,
                Expr::value(db_quantity(stock)),
            );
        }
        let rows = query
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| slug_conflict(e, "update product"))?;
        Ok(rows.into_iter().next().map(product_from_model))
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        amount: u32,
    ) -> Result<Option<u32>, OrdersServiceError> {
        let row = decrement_stock_on(&self.db, id, amount)
            .await
            .context("decrement product stock")?;
        Ok(row.map(|row| domain_quantity(row.stock_quantity)))
    }

    async fn set_stock(&self, id: ProductId, quantity: u32) -> Result<bool, OrdersServiceError> {
        let result = products::Entity::update_many()
            .col_expr(
                products::Column::StockQuantity,
                Expr::value(db_quantity(quantity)),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .context("set product stock")?;
        Ok(result.rows_affected > 0)
    }
}

/// Unique violations on `products` can only come from the slug index.
fn slug_conflict(err: DbErr, action: &'static str) -> OrdersServiceError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return OrdersServiceError::DuplicateSlug;
    }
    anyhow::Error::new(err).context(action).into()
}

fn product_from_model(model: products::Model) -> Product {
    Product {
        id: ProductId(model.id),
        name: model.name,
        slug: model.slug,
        description: model.description,
        price: Money(model.price),
        stock_quantity: domain_quantity(model.stock_quantity),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Cart repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCartRepository {
    pub db: DatabaseConnection,
}

impl CartRepository for DbCartRepository {
    async fn list(&self, user_id: UserId) -> Result<Vec<CartItem>, OrdersServiceError> {
        let models = cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(user_id.0))
            .order_by_asc(cart_items::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list cart items")?;
        Ok(models.into_iter().map(cart_item_from_model).collect())
    }

    async fn count(&self, user_id: UserId) -> Result<u64, OrdersServiceError> {
        let count = cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(user_id.0))
            .count(&self.db)
            .await
            .context("count cart items")?;
        Ok(count)
    }

    async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, OrdersServiceError> {
        let now = Utc::now();
        let row = cart_items::ActiveModel {
            id: Set(CartItemId::generate().0),
            user_id: Set(user_id.0),
            product_id: Set(product_id.0),
            quantity: Set(db_quantity(quantity)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // Existing line for the product: add to its quantity instead.
        let model = cart_items::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([cart_items::Column::UserId, cart_items::Column::ProductId])
                    .value(
                        cart_items::Column::Quantity,
                        Expr::col((cart_items::Entity, cart_items::Column::Quantity)).add(
                            Expr::col((Alias::new("excluded"), cart_items::Column::Quantity)),
                        ),
                    )
                    .update_column(cart_items::Column::UpdatedAt)
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
            .context("upsert cart item")?;
        Ok(cart_item_from_model(model))
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<bool, OrdersServiceError> {
        let result = cart_items::Entity::update_many()
            .col_expr(cart_items::Column::Quantity, Expr::value(db_quantity(quantity)))
            .col_expr(cart_items::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(cart_items::Column::Id.eq(item_id.0))
            .filter(cart_items::Column::UserId.eq(user_id.0))
            .exec(&self.db)
            .await
            .context("update cart item quantity")?;
        Ok(result.rows_affected > 0)
    }

    async fn remove(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, OrdersServiceError> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::Id.eq(item_id.0))
            .filter(cart_items::Column::UserId.eq(user_id.0))
            .exec(&self.db)
            .await
            .context("delete cart item")?;
        Ok(result.rows_affected > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, OrdersServiceError> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::UserId.eq(user_id.0))
            .exec(&self.db)
            .await
            .context("clear cart")?;
        Ok(result.rows_affected)
    }
}

fn cart_item_from_model(model: cart_items::Model) -> CartItem {
    CartItem {
        id: CartItemId(model.id),
        user_id: UserId(model.user_id),
        product_id: ProductId(model.product_id),
        quantity: domain_quantity(model.quantity),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Order repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl DbOrderRepository {
    /// Load items for a page of orders in one query and attach them.
    async fn with_items(&self, models: Vec<orders::Model>) -> Result<Vec<Order>, OrdersServiceError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = models.iter().map(|model| model.id).collect();
        let item_models = order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(ids))
            .order_by_asc(order_items::Column::Id)
            .all(&self.db)
            .await
            .context("list order items")?;

        let mut grouped: HashMap<Uuid, Vec<order_items::Model>> = HashMap::new();
        for item in item_models {
            grouped.entry(item.order_id).or_default().push(item);
        }
        models
            .into_iter()
            .map(|model| {
                let items = grouped.remove(&model.id).unwrap_or_default();
                order_from_model(model, items)
            })
            .collect()
    }
}

impl OrderRepository for DbOrderRepository {
    async fn create_with_items(&self, order: &Order) -> Result<(), OrdersServiceError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let order = order.clone();
                Box::pin(async move { insert_order_on(txn, &order).await })
            })
            .await
            .context("create order with items")?;
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrdersServiceError> {
        let Some(model) = orders::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find order by id")?
        else {
            return Ok(None);
        };
        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(id.0))
            .order_by_asc(order_items::Column::Id)
            .all(&self.db)
            .await
            .context("find order items")?;
        order_from_model(model, items).map(Some)
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let models = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id.0))
            .order_by_desc(orders::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list orders by user")?;
        self.with_items(models).await
    }

    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let mut query = orders::Entity::find();
        if let Some(status) = status {
            query = query.filter(orders::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(orders::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list orders")?;
        self.with_items(models).await
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, OrdersServiceError> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(to.as_str()))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(id.0))
            .filter(orders::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .context("update order status")?;
        Ok(result.rows_affected > 0)
    }

    async fn update_fulfillment(
        &self,
        id: OrderId,
        update: &FulfillmentUpdate,
    ) -> Result<bool, OrdersServiceError> {
        let mut query = orders::Entity::update_many()
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(id.0));
        if let Some(status) = update.payment_status {
            query = query.col_expr(orders::Column::PaymentStatus, Expr::value(status.as_str()));
        }
        if let Some(tracking) = &update.tracking_number {
            query = query.col_expr(
                orders::Column::TrackingNumber,
                Expr::value(tracking.clone()),
            );
        }
        if let Some(notes) = &update.notes {
            query = query.col_expr(orders::Column::Notes, Expr::value(notes.clone()));
        }
        let result = query
            .exec(&self.db)
            .await
            .context("update order fulfillment")?;
        Ok(result.rows_affected > 0)
    }

    async fn stats(&self, top: u64) -> Result<OrderStats, OrdersServiceError> {
        // SUM over bigint yields numeric in Postgres.
        let revenue: Option<Option<i64>> = orders::Entity::find()
            .select_only()
            .column_as(
                Expr::col(orders::Column::TotalAmount)
                    .sum()
                    .cast_as(Alias::new("bigint")),
                "total_revenue",
            )
            .into_tuple()
            .one(&self.db)
            .await
            .context("sum order revenue")?;
        let order_count = orders::Entity::find()
            .count(&self.db)
            .await
            .context("count orders")?;
        let pending_count = orders::Entity::find()
            .filter(orders::Column::Status.eq(OrderStatus::Pending.as_str()))
            .count(&self.db)
            .await
            .context("count pending orders")?;

        let sold: Vec<(i32, Option<i64>)> = order_items::Entity::find()
            .select_only()
            .column(order_items::Column::ProductId)
            .column_as(
                Expr::col(order_items::Column::Quantity)
                    .sum()
                    .cast_as(Alias::new("bigint")),
                "units_sold",
            )
            .group_by(order_items::Column::ProductId)
            .order_by_desc(Expr::col(Alias::new("units_sold")))
            .order_by_asc(order_items::Column::ProductId)
            .limit(top)
            .into_tuple()
            .all(&self.db)
            .await
            .context("rank products by units sold")?;

        let names: HashMap<i32, String> = if sold.is_empty() {
            HashMap::new()
        } else {
            products::Entity::find()
                .filter(products::Column::Id.is_in(sold.iter().map(|(id, _)| *id)))
                .all(&self.db)
                .await
                .context("find top product names")?
                .into_iter()
                .map(|model| (model.id, model.name))
                .collect()
        };
        let top_products = sold
            .into_iter()
            .map(|(id, units)| ProductSales {
                product_id: ProductId(id),
                product_name: names.get(&id).cloned(),
                units_sold: units.and_then(|u| u64::try_from(u).ok()).unwrap_or(0),
            })
            .collect();

        Ok(OrderStats {
            total_revenue: Money(revenue.flatten().unwrap_or(0)),
            order_count,
            pending_count,
            top_products,
        })
    }
}

fn order_from_model(
    model: orders::Model,
    items: Vec<order_items::Model>,
) -> Result<Order, OrdersServiceError> {
    let status = OrderStatus::parse(&model.status)
        .with_context(|| format!("unknown order status {:?}", model.status))?;
    let payment_status = PaymentStatus::parse(&model.payment_status)
        .with_context(|| format!("unknown payment status {:?}", model.payment_status))?;
    let payment_method = PaymentMethod::parse(&model.payment_method)
        .with_context(|| format!("unknown payment method {:?}", model.payment_method))?;
    let order_id = OrderId(model.id);
    Ok(Order {
        id: order_id,
        user_id: UserId(model.user_id),
        status,
        total_amount: Money(model.total_amount),
        shipping_address: model.shipping_address,
        payment_method,
        payment_status,
        tracking_number: model.tracking_number,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
        items: items
            .into_iter()
            .map(|item| OrderItem {
                id: item.id,
                order_id,
                product_id: ProductId(item.product_id),
                quantity: domain_quantity(item.quantity),
                price_at_purchase: Money(item.price_at_purchase),
                created_at: item.created_at,
            })
            .collect(),
    })
}

// ── PlaceOrder port ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum PlaceTxnError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("stock shortfall")]
    Shortfall(Vec<StockShortfall>),
    #[error("price changed")]
    PriceChanged(Vec<ProductId>),
}

#[derive(Clone)]
pub struct DbPlaceOrderPort {
    pub db: DatabaseConnection,
}

impl PlaceOrderPort for DbPlaceOrderPort {
    async fn place(&self, order: &Order) -> Result<PlaceOutcome, OrdersServiceError> {
        let result = self
            .db
            .transaction::<_, (), PlaceTxnError>(|txn| {
                let order = order.clone();
                Box::pin(async move {
                    // Lock product rows in id order so concurrent checkouts cannot deadlock.
                    let mut lines: Vec<_> = order
                        .items
                        .iter()
                        .map(|item| (item.product_id, item.quantity, item.price_at_purchase))
                        .collect();
                    lines.sort_by_key(|(product_id, _, _)| *product_id);

                    let mut shortfalls = Vec::new();
                    let mut repriced = Vec::new();
                    for (product_id, quantity, price) in lines {
                        if let Some(row) = decrement_stock_on(txn, product_id, quantity).await? {
                            // The row is locked now; its price is the one being charged.
                            if row.price != price.minor_units() {
                                repriced.push(product_id);
                            }
                            continue;
                        }
                        let current = products::Entity::find_by_id(product_id.0).one(txn).await?;
                        shortfalls.push(StockShortfall {
                            product_id,
                            product_name: current.as_ref().map(|p| p.name.clone()),
                            requested: quantity,
                            available: current.map_or(0, |p| domain_quantity(p.stock_quantity)),
                        });
                    }
                    if !shortfalls.is_empty() {
                        return Err(PlaceTxnError::Shortfall(shortfalls));
                    }
                    if !repriced.is_empty() {
                        return Err(PlaceTxnError::PriceChanged(repriced));
                    }

                    insert_order_on(txn, &order).await?;
                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(PlaceOutcome::Committed),
            Err(TransactionError::Transaction(PlaceTxnError::Shortfall(shortfalls))) => {
                Ok(PlaceOutcome::Shortfall(shortfalls))
            }
            Err(TransactionError::Transaction(PlaceTxnError::PriceChanged(product_ids))) => {
                Ok(PlaceOutcome::PriceChanged(product_ids))
            }
            Err(TransactionError::Transaction(PlaceTxnError::Db(e)))
            | Err(TransactionError::Connection(e)) => {
                Err(anyhow::Error::new(e).context("place order").into())
            }
        }
    }
}
