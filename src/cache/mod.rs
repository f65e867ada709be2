//! Cache Module
//!
//! Provides the loading cache engine: LRU eviction, time-based
//! expiration, call coalescing and asynchronous refresh.

mod coalesce;
mod entry;
mod loading;
mod lru;
mod policy;
mod stats;


// Re-export public types
pub use coalesce::Coalescer;
pub use entry::{current_timestamp_ms, CacheEntry};
pub use loading::{CacheBuilder, Loader, LoaderFuture, LoadingCache};
pub use lru::{EvictionStore, LruStore};
pub use policy::ExpiryPolicy;
pub use stats::{CacheStats, StatsCounter};

// == Public Constants ==
/// Capacity value that disables eviction.
pub const UNBOUNDED: usize = 0;

/// Default bound of the recency-promotion event queue.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

// == Lock Helpers ==
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquires a shared guard; poisoning is not propagated.
pub(crate) fn read_guard<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires an exclusive guard; poisoning is not propagated.
pub(crate) fn write_guard<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires a mutex guard; poisoning is not propagated.
pub(crate) fn lock_guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
