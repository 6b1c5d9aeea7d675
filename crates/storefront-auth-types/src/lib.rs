//! Identity types shared by services sitting behind the storefront gateway.

pub mod identity;
