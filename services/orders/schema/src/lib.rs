//! sea-orm entities for the orders service tables.

pub mod cart_items;
pub mod order_items;
pub mod orders;
pub mod products;
