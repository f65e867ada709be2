//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access and
//! write timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::{read_guard, write_guard};

// == Cache Entry ==
/// A single cached mapping.
///
/// The value and both timestamps are mutable in place: the value behind
/// the entry's own lock (refresh and overwrite replace it without the
/// entry leaving the container), the timestamps as atomics so a read hit
/// can touch the access time while holding only the container's shared
/// lock.
#[derive(Debug)]
pub struct CacheEntry<K, V> {
    /// Identity of the mapping
    key: K,
    /// The stored value
    value: RwLock<V>,
    /// Last time this entry satisfied a read (Unix milliseconds)
    accessed: AtomicU64,
    /// Last time the value was computed or overwritten (Unix milliseconds)
    written: AtomicU64,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new entry with both timestamps set to now.
    pub fn new(key: K, value: V) -> Self {
        let now = current_timestamp_ms();
        Self {
            key,
            value: RwLock::new(value),
            accessed: AtomicU64::new(now),
            written: AtomicU64::new(now),
        }
    }

    /// Returns the entry's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns a clone of the current value.
    pub fn value(&self) -> V
    where
        V: Clone,
    {
        read_guard(&self.value).clone()
    }

    // == Store Value ==
    /// Replaces the value in place and moves both timestamps to now.
    ///
    /// Used by refresh and by overwriting puts; the entry keeps its slot
    /// in the container.
    pub fn store_value(&self, value: V) {
        *write_guard(&self.value) = value;
        let now = current_timestamp_ms();
        self.written.store(now, Ordering::Release);
        self.accessed.store(now, Ordering::Release);
    }

    // == Touch ==
    /// Marks the entry as read now. The access time never moves
    /// backwards.
    pub fn touch(&self) {
        self.accessed
            .fetch_max(current_timestamp_ms(), Ordering::AcqRel);
    }

    /// Last access time in Unix milliseconds.
    pub fn accessed_ms(&self) -> u64 {
        self.accessed.load(Ordering::Acquire)
    }

    /// Last write time in Unix milliseconds.
    pub fn written_ms(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
