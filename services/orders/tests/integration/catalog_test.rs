use storefront_domain::id::ProductId;
use storefront_domain::money::Money;
use storefront_orders::domain::repository::CartRepository;
use storefront_orders::domain::types::{NewProduct, ProductUpdate};
use storefront_orders::error::OrdersServiceError;
use storefront_orders::usecase::cart::GetCartUseCase;
use storefront_orders::usecase::product::{CreateProductUseCase, UpdateProductUseCase};

use crate::helpers::{MemoryStore, test_user};

fn store() -> MemoryStore {
    MemoryStore::with_products(&[(1, "Kettle", 3_000, 4), (2, "Toaster", 4_500, 1)])
}

fn new_product(slug: &str) -> NewProduct {
    NewProduct {
        name: "Another Kettle".to_owned(),
        slug: slug.to_owned(),
        description: None,
        price: Money(2_000),
        stock_quantity: 3,
    }
}

#[tokio::test]
async fn should_reject_duplicate_slug_on_create() {
    let store = store();
    let create = CreateProductUseCase { repo: store.clone() };

    let result = create.execute(new_product("kettle")).await;

    assert!(matches!(result, Err(OrdersServiceError::DuplicateSlug)));
    assert!(create.execute(new_product("kettle-2")).await.is_ok());
}

#[tokio::test]
async fn should_reject_duplicate_slug_on_edit() {
    let store = store();
    let edit = UpdateProductUseCase { repo: store.clone() };

    let result = edit
        .execute(
            ProductId(2),
            ProductUpdate {
                slug: Some("kettle".to_owned()),
                ..ProductUpdate::default()
            },
        )
        .await;

    assert!(matches!(result, Err(OrdersServiceError::DuplicateSlug)));
}

#[tokio::test]
async fn should_reprice_open_carts_after_edit() {
    let store = store();
    let user = test_user();
    store.add(user, ProductId(1), 2).await.unwrap();
    let get = GetCartUseCase {
        carts: store.clone(),
        products: store.clone(),
    };
    assert_eq!(get.execute(user).await.unwrap().subtotal, Money(6_000));

    let edited = UpdateProductUseCase { repo: store.clone() }
        .execute(
            ProductId(1),
            ProductUpdate {
                name: Some("  Steel Kettle ".to_owned()),
                description: Some(Some("1.7 litre".to_owned())),
                price: Some(Money(3_500)),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.name, "Steel Kettle");
    assert_eq!(edited.slug, "kettle");
    assert_eq!(edited.description.as_deref(), Some("1.7 litre"));
    assert_eq!(get.execute(user).await.unwrap().subtotal, Money(7_000));
}
