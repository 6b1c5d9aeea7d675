use storefront_domain::id::ProductId;
use storefront_domain::money::Money;
use storefront_domain::pagination::PageRequest;

use crate::domain::repository::ProductRepository;
use crate::domain::types::{NewProduct, Product, ProductUpdate};
use crate::error::OrdersServiceError;

pub struct GetProductUseCase<R: ProductRepository> {
    pub repo: R,
}

impl<R: ProductRepository> GetProductUseCase<R> {
    pub async fn execute(&self, id: ProductId) -> Result<Product, OrdersServiceError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(OrdersServiceError::ProductNotFound)
    }
}

pub struct ListProductsUseCase<R: ProductRepository> {
    pub repo: R,
}

impl<R: ProductRepository> ListProductsUseCase<R> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<Product>, OrdersServiceError> {
        self.repo.list(page.clamped()).await
    }
}

pub struct CreateProductUseCase<R: ProductRepository> {
    pub repo: R,
}

impl<R: ProductRepository> CreateProductUseCase<R> {
    pub async fn execute(&self, product: NewProduct) -> Result<Product, OrdersServiceError> {
        let mut missing = Vec::new();
        if product.name.trim().is_empty() {
            missing.push("name");
        }
        if product.slug.trim().is_empty() {
            missing.push("slug");
        }
        if !missing.is_empty() {
            return Err(OrdersServiceError::MissingFields(missing));
        }
        if product.price < Money::ZERO {
            return Err(OrdersServiceError::InvalidPrice);
        }
        let created = self.repo.create(&product).await?;
        tracing::info!(product_id = %created.id, slug = %created.slug, "product created");
        Ok(created)
    }
}

pub struct UpdateProductUseCase<R: ProductRepository> {
    pub repo: R,
}

impl<R: ProductRepository> UpdateProductUseCase<R> {
    /// Partial edit. Orders already placed keep their `price_at_purchase`.
    pub async fn execute(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, OrdersServiceError> {
        if update.is_empty() {
            return Err(OrdersServiceError::MissingFields(vec![
                "name",
                "slug",
                "description",
                "price",
                "stock_quantity",
            ]));
        }
        let update = ProductUpdate {
            name: update.name.map(|name| name.trim().to_owned()),
            slug: update.slug.map(|slug| slug.trim().to_owned()),
            // A blank description clears it.
            description: update.description.map(|description| {
                description
                    .map(|d| d.trim().to_owned())
                    .filter(|d| !d.is_empty())
            }),
            ..update
        };
        let mut blank = Vec::new();
        if update.name.as_deref() == Some("") {
            blank.push("name");
        }
        if update.slug.as_deref() == Some("") {
            blank.push("slug");
        }
        if !blank.is_empty() {
            return Err(OrdersServiceError::MissingFields(blank));
        }
        if update.price.is_some_and(|price| price < Money::ZERO) {
            return Err(OrdersServiceError::InvalidPrice);
        }

        let updated = self
            .repo
            .update(id, &update)
            .await?
            .ok_or(OrdersServiceError::ProductNotFound)?;
        tracing::info!(
            product_id = %id,
            price = %updated.price,
            stock = updated.stock_quantity,
            "product updated"
        );
        Ok(updated)
    }
}

pub struct SetStockUseCase<R: ProductRepository> {
    pub repo: R,
}

impl<R: ProductRepository> SetStockUseCase<R> {
    pub async fn execute(&self, id: ProductId, quantity: u32) -> Result<(), OrdersServiceError> {
        if !self.repo.set_stock(id, quantity).await? {
            return Err(OrdersServiceError::ProductNotFound);
        }
        tracing::info!(product_id = %id, quantity, "stock set");
        Ok(())
    }
}
