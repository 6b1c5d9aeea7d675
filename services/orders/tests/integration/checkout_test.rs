use storefront_domain::id::ProductId;
use storefront_domain::money::Money;
use storefront_orders::domain::repository::CartRepository;
use storefront_orders::domain::types::{OrderStatus, PaymentStatus, ProductUpdate};
use storefront_orders::error::OrdersServiceError;
use storefront_orders::usecase::checkout::cart_line_items;
use storefront_orders::usecase::product::UpdateProductUseCase;

use crate::helpers::{MemoryStore, checkout_input, checkout_usecase, test_user};

const YACHT_PRICE: i64 = 10_000_000_000_000_000;

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_decrement_stock_and_record_order() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let user = test_user();
    store.add(user, ProductId(1), 3).await.unwrap();

    let out = checkout_usecase(&store)
        .execute(checkout_input(user, &[(1, 3)]))
        .await
        .unwrap();

    assert_eq!(store.stock_of(1), 2);
    let orders = store.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, out.order.id);
    assert_eq!(orders[0].items.len(), 1);
    assert_eq!(orders[0].items[0].quantity, 3);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    assert_eq!(orders[0].payment_status, PaymentStatus::Pending);
    assert!(out.cart_cleared);
    assert_eq!(store.cart_len(user), 0);
}

#[tokio::test]
async fn should_total_subtotal_shipping_and_tax() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let out = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 3)]))
        .await
        .unwrap();

    // 7500 subtotal, below the free-shipping threshold.
    assert_eq!(out.totals.subtotal, Money(7_500));
    assert_eq!(out.totals.shipping, Money(1_000));
    assert_eq!(out.totals.tax, Money(750));
    assert_eq!(out.totals.total, Money(9_250));
    assert_eq!(out.order.total_amount, Money(9_250));
}

#[tokio::test]
async fn should_start_paid_when_payment_is_captured() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let mut usecase = checkout_usecase(&store);
    usecase.capture_payment = true;
    let out = usecase
        .execute(checkout_input(test_user(), &[(1, 1)]))
        .await
        .unwrap();
    assert_eq!(out.order.status, OrderStatus::Processing);
    assert_eq!(out.order.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn should_merge_duplicate_lines_before_reserving() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let out = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 2), (1, 2)]))
        .await
        .unwrap();
    assert_eq!(out.order.items.len(), 1);
    assert_eq!(out.order.items[0].quantity, 4);
    assert_eq!(store.stock_of(1), 1);
}

#[tokio::test]
async fn should_total_high_value_order_exactly() {
    let store = MemoryStore::with_products(&[(1, "Yacht", YACHT_PRICE, 5)]);
    let out = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 1)]))
        .await
        .unwrap();

    assert_eq!(out.totals.subtotal, Money(YACHT_PRICE));
    assert_eq!(out.totals.shipping, Money::ZERO);
    assert_eq!(out.totals.tax, Money(1_000_000_000_000_000));
    assert_eq!(out.order.total_amount, Money(11_000_000_000_000_000));
    assert_eq!(store.stock_of(1), 4);
}

#[tokio::test]
async fn should_keep_purchase_price_after_catalog_change() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let out = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 1)]))
        .await
        .unwrap();

    let edit = UpdateProductUseCase {
        repo: store.clone(),
    };
    let edited = edit
        .execute(
            ProductId(1),
            ProductUpdate {
                price: Some(Money(9_900)),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.price, Money(9_900));

    let stored = &store.orders()[0];
    assert_eq!(stored.id, out.order.id);
    assert_eq!(stored.items[0].price_at_purchase, Money(2_500));
}

// ── Rejections ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_shortfall_without_writing() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 2)]);
    let user = test_user();
    store.add(user, ProductId(1), 3).await.unwrap();

    let result = checkout_usecase(&store)
        .execute(checkout_input(user, &[(1, 3)]))
        .await;

    let Err(OrdersServiceError::StockShortfall(shortfalls)) = result else {
        panic!("expected StockShortfall, got {result:?}");
    };
    assert_eq!(shortfalls.len(), 1);
    assert_eq!(shortfalls[0].product_name.as_deref(), Some("Teapot"));
    assert_eq!(shortfalls[0].requested, 3);
    assert_eq!(shortfalls[0].available, 2);
    assert_eq!(store.stock_of(1), 2);
    assert!(store.orders().is_empty());
    assert_eq!(store.cart_len(user), 1, "cart must stay editable");
}

#[tokio::test]
async fn should_list_every_short_line() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 1), (2, "Cup", 500, 0)]);
    let result = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 2), (2, 1), (3, 1)]))
        .await;
    let Err(OrdersServiceError::StockShortfall(shortfalls)) = result else {
        panic!("expected StockShortfall, got {result:?}");
    };
    let ids: Vec<ProductId> = shortfalls.iter().map(|s| s.product_id).collect();
    assert_eq!(ids, vec![ProductId(1), ProductId(2), ProductId(3)]);
    assert_eq!(shortfalls[2].product_name, None);
}

#[tokio::test]
async fn should_reject_order_beyond_money_range() {
    let store = MemoryStore::with_products(&[(1, "Yacht", YACHT_PRICE, 5_000)]);
    let user = test_user();
    store.add(user, ProductId(1), 1_000).await.unwrap();

    let result = checkout_usecase(&store)
        .execute(checkout_input(user, &[(1, 1_000)]))
        .await;

    assert!(matches!(result, Err(OrdersServiceError::AmountOutOfRange)));
    assert_eq!(store.stock_of(1), 5_000);
    assert!(store.orders().is_empty());
    assert_eq!(store.cart_len(user), 1);
}

#[tokio::test]
async fn should_reject_empty_cart() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let result = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[]))
        .await;
    assert!(matches!(result, Err(OrdersServiceError::EmptyCart)));
}

#[tokio::test]
async fn should_reject_zero_quantity_line() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let result = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 0)]))
        .await;
    assert!(matches!(result, Err(OrdersServiceError::InvalidQuantity)));
    assert_eq!(store.stock_of(1), 5);
}

#[tokio::test]
async fn should_reject_blank_shipping_address() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let mut input = checkout_input(test_user(), &[(1, 1)]);
    input.shipping_address = "   ".to_owned();
    let result = checkout_usecase(&store).execute(input).await;
    assert!(matches!(result, Err(OrdersServiceError::MissingFields(_))));
}

#[tokio::test]
async fn should_reject_stale_expected_total() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let mut input = checkout_input(test_user(), &[(1, 1)]);
    input.expected_total = Some(Money(1_000));

    let result = checkout_usecase(&store).execute(input).await;

    assert!(matches!(
        result,
        Err(OrdersServiceError::TotalMismatch {
            expected: Money(1_000),
            actual: Money(3_750),
        })
    ));
    assert_eq!(store.stock_of(1), 5);
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn should_accept_matching_expected_total() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let mut input = checkout_input(test_user(), &[(1, 1)]);
    input.expected_total = Some(Money(3_750));
    assert!(checkout_usecase(&store).execute(input).await.is_ok());
}

// ── Failure handling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_inventory_unavailable_when_stock_read_fails() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    store.configure(|state| state.fail_product_reads = true);

    let result = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 1)]))
        .await;

    assert!(matches!(
        result,
        Err(OrdersServiceError::InventoryUnavailable(_))
    ));
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn should_report_inventory_unavailable_when_cart_read_fails() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let user = test_user();
    store.add(user, ProductId(1), 1).await.unwrap();
    store.configure(|state| state.fail_cart_reads = true);

    let result = cart_line_items(&store, user).await;

    assert!(matches!(
        result,
        Err(OrdersServiceError::InventoryUnavailable(_))
    ));
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn should_leave_no_trace_when_order_write_fails() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let user = test_user();
    store.add(user, ProductId(1), 2).await.unwrap();
    store.configure(|state| state.fail_order_writes = true);

    let result = checkout_usecase(&store)
        .execute(checkout_input(user, &[(1, 2)]))
        .await;

    assert!(matches!(
        result,
        Err(OrdersServiceError::OrderPersistenceFailed(_))
    ));
    assert_eq!(store.stock_of(1), 5);
    assert!(store.orders().is_empty());
    assert_eq!(store.cart_len(user), 1);
}

#[tokio::test]
async fn should_keep_order_when_cart_clear_fails() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let user = test_user();
    store.add(user, ProductId(1), 1).await.unwrap();
    store.configure(|state| state.fail_cart_clear = true);

    let out = checkout_usecase(&store)
        .execute(checkout_input(user, &[(1, 1)]))
        .await
        .unwrap();

    assert!(!out.cart_cleared);
    assert_eq!(store.orders().len(), 1);
    assert_eq!(store.stock_of(1), 4);
    assert_eq!(store.cart_len(user), 1);
}

#[tokio::test]
async fn should_reject_when_stock_moves_after_verification() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    store.configure(|state| state.steal_after_read = Some((ProductId(1), 4)));

    let result = checkout_usecase(&store)
        .execute(checkout_input(test_user(), &[(1, 3)]))
        .await;

    let Err(OrdersServiceError::StockShortfall(shortfalls)) = result else {
        panic!("expected StockShortfall, got {result:?}");
    };
    assert_eq!(shortfalls[0].available, 1);
    assert_eq!(store.stock_of(1), 1);
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn should_reject_when_price_moves_after_verification() {
    let store = MemoryStore::with_products(&[(1, "Teapot", 2_500, 5)]);
    let user = test_user();
    store.add(user, ProductId(1), 2).await.unwrap();
    store.configure(|state| state.reprice_after_read = Some((ProductId(1), 3_100)));

    let result = checkout_usecase(&store)
        .execute(checkout_input(user, &[(1, 2)]))
        .await;

    let Err(OrdersServiceError::PriceChanged(product_ids)) = result else {
        panic!("expected PriceChanged, got {result:?}");
    };
    assert_eq!(product_ids, vec![ProductId(1)]);
    assert_eq!(store.stock_of(1), 5);
    assert!(store.orders().is_empty());
    assert_eq!(store.cart_len(user), 1);

    // A retry picks up the new price.
    let out = checkout_usecase(&store)
        .execute(checkout_input(user, &[(1, 2)]))
        .await
        .unwrap();
    assert_eq!(out.order.items[0].price_at_purchase, Money(3_100));
}
