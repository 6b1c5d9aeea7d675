use sea_orm_migration::prelude::*;

mod m20260301_000001_create_products;
mod m20260301_000002_create_cart_items;
mod m20260301_000003_create_orders;
mod m20260301_000004_create_order_items;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_products::Migration),
            Box::new(m20260301_000002_create_cart_items::Migration),
            Box::new(m20260301_000003_create_orders::Migration),
            Box::new(m20260301_000004_create_order_items::Migration),
        ]
    }
}
