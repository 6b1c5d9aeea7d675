//! Ambient plumbing shared by storefront services: configuration loading,
//! tracing setup, health checks, and request-id middleware.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
