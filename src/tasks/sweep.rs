//! Expiration Sweep Task
//!
//! Background task that periodically removes time-expired cache
//! entries.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::{current_timestamp_ms, EvictionStore, ExpiryPolicy, StatsCounter};

/// Spawns the periodic expiration sweep.
///
/// The task runs until aborted. Each pass enumerates the store under
/// its guard, then removes the entries found expired, counting one
/// eviction per successful removal.
///
/// # Arguments
/// * `store` - Shared eviction store to sweep
/// * `policy` - Thresholds deciding what counts as expired
/// * `stats` - Counter set receiving one eviction per removal
/// * `every` - Interval between sweep passes
///
/// # Returns
/// A JoinHandle for the spawned task, used to abort it when the owning
/// cache is dropped.
pub fn spawn_sweep_task<K, V>(
    store: Arc<dyn EvictionStore<K, V>>,
    policy: ExpiryPolicy,
    stats: Arc<StatsCounter>,
    every: Duration,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval = ?every, "expiration sweep started");

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first
        // sweep happens one full interval after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = sweep_once(store.as_ref(), &policy, &stats);
            if removed > 0 {
                debug!(removed, "expiration sweep removed entries");
            }
        }
    })
}

/// One sweep pass; returns the number of entries removed.
///
/// Expired keys are collected under the store's enumeration guard, then
/// removed one by one; a key that vanished in between simply does not
/// count.
pub(crate) fn sweep_once<K, V>(
    store: &dyn EvictionStore<K, V>,
    policy: &ExpiryPolicy,
    stats: &StatsCounter,
) -> usize
where
    K: Clone,
{
    let now = current_timestamp_ms();
    let mut expired = Vec::new();
    store.for_each(&mut |entry| {
        if policy.is_expired(entry, now) {
            expired.push(entry.key().clone());
        }
    });

    let mut removed = 0;
    for key in &expired {
        if store.remove(key).is_some() {
            stats.record_eviction();
            removed += 1;
        }
    }
    removed
}
