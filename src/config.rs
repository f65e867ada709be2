//! Cache Configuration Module
//!
//! Holds the tunable parameters a builder applies to a cache instance.

use std::time::Duration;

use crate::cache::{DEFAULT_EVENT_BUFFER, UNBOUNDED};

/// Cache tuning parameters.
///
/// A zero duration disables the corresponding time-based behavior, and a
/// capacity of [`UNBOUNDED`] disables eviction.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Expire entries not read within this window
    pub expire_after_access: Duration,
    /// Expire entries not written within this window
    pub expire_after_write: Duration,
    /// Refresh entries in the background once their write is older than this
    pub refresh_after_write: Duration,
    /// Bound of the recency-promotion event queue
    pub event_buffer: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: UNBOUNDED,
            expire_after_access: Duration::ZERO,
            expire_after_write: Duration::ZERO,
            refresh_after_write: Duration::ZERO,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}
