//! Loading Cache - an in-process key/value cache
//!
//! Combines bounded LRU eviction, time-based expiration, load-on-miss
//! with call coalescing and asynchronous stale-value refresh behind a
//! single in-memory layer.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    CacheBuilder, CacheEntry, CacheStats, EvictionStore, LoadingCache, LruStore, UNBOUNDED,
};
pub use config::CacheConfig;
pub use error::{BoxError, CacheError, Result};
