//! Domain types shared across storefront services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers as well as at the storage boundary.

pub mod id;
pub mod money;
pub mod pagination;
