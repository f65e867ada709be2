//! Background Tasks Module
//!
//! Workers owned by a cache instance for its lifetime: the periodic
//! expiration sweep and the recency event worker. Both are aborted when
//! the cache is dropped.

mod events;
mod sweep;

pub use events::{spawn_event_worker, CacheEvent};
pub use sweep::spawn_sweep_task;
