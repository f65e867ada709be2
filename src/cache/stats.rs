//! Cache Statistics Module
//!
//! Tracks cache performance metrics: hits, misses, load outcomes, load
//! latency and evictions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

// == Stats Counter ==
/// Lock-free counters incremented from arbitrary threads.
///
/// Counters only ever increase; a fresh cache instance starts a fresh
/// counter set. Read them through [`StatsCounter::snapshot`].
#[derive(Debug, Default)]
pub struct StatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    load_success: AtomicU64,
    load_error: AtomicU64,
    total_load_time_ns: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounter {
    // == Constructor ==
    /// Creates a counter set with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to the hit counter.
    pub fn record_hits(&self, count: u64) {
        self.hits.fetch_add(count, Ordering::Relaxed);
    }

    /// Adds to the miss counter.
    pub fn record_misses(&self, count: u64) {
        self.misses.fetch_add(count, Ordering::Relaxed);
    }

    /// Records one successful loader invocation and its latency.
    pub fn record_load_success(&self, load_time: Duration) {
        self.load_success.fetch_add(1, Ordering::Relaxed);
        self.total_load_time_ns
            .fetch_add(load_time.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Records one failed loader invocation and its latency.
    pub fn record_load_error(&self, load_time: Duration) {
        self.load_error.fetch_add(1, Ordering::Relaxed);
        self.total_load_time_ns
            .fetch_add(load_time.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Increments the eviction counter.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies all counters into a point-in-time value.
    ///
    /// Each individual read is atomic; the set as a whole is eventually
    /// consistent under concurrent increments.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            load_success: self.load_success.load(Ordering::Relaxed),
            load_error: self.load_error.load(Ordering::Relaxed),
            total_load_time_ns: self.total_load_time_ns.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of the cache performance counters.
///
/// Derived metrics are computed from the snapshot, never from live
/// counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of reads served from the cache
    pub hits: u64,
    /// Number of reads that went to the loader
    pub misses: u64,
    /// Number of successful loader invocations
    pub load_success: u64,
    /// Number of failed loader invocations
    pub load_error: u64,
    /// Cumulative time spent in the loader, in nanoseconds
    pub total_load_time_ns: u64,
    /// Number of entries removed by capacity or expiry
    pub evictions: u64,
}

impl CacheStats {
    /// Total number of reads observed.
    pub fn request_count(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hits over requests; 1.0 when nothing has been requested.
    pub fn hit_rate(&self) -> f64 {
        let total = self.request_count();
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Misses over requests; 0.0 when nothing has been requested.
    pub fn miss_rate(&self) -> f64 {
        let total = self.request_count();
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64
        }
    }

    /// Failed loads over total loads; 0.0 when nothing has loaded.
    pub fn load_error_rate(&self) -> f64 {
        let total = self.load_success + self.load_error;
        if total == 0 {
            0.0
        } else {
            self.load_error as f64 / total as f64
        }
    }

    /// Mean time spent per loader invocation.
    pub fn average_load_penalty(&self) -> Duration {
        let total = self.load_success + self.load_error;
        if total == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_load_time_ns / total)
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits: {}, misses: {}, successes: {}, errors: {}, load time: {:?}, evictions: {}",
            self.hits,
            self.misses,
            self.load_success,
            self.load_error,
            Duration::from_nanos(self.total_load_time_ns),
            self.evictions
        )
    }
}
