//! Request-caching layer for the token site.
//!
//! Intercepted fetches are classified into a caching strategy
//! (CacheFirst, NetworkFirst, StaleWhileRevalidate) and served from a
//! partitioned store with staleness control, background revalidation
//! and bounded partition sizes.

pub mod cache;
pub mod classify;
pub mod core;
pub mod fetch;
pub mod lifecycle;
pub mod revalidate;
pub mod staleness;
pub mod strategy;
