//! # Cache Backends
//!
//! Implementations of [`yc_core::Cache`]:
//! - [`RedisCache`]: network cache used in production
//! - [`InMemoryCache`]: process-local cache for tests and offline runs

pub mod memory;
pub mod redis;

pub use memory::InMemoryCache;
pub use self::redis::RedisCache;
