//! Test utilities for storefront services.
//!
//! Dev-dependency only.

pub mod auth;
