//! Recency Event Worker
//!
//! Single background worker that applies hit promotions off the
//! caller's read path.

use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::EvictionStore;

// == Cache Event ==
/// Bookkeeping message processed off the read path.
#[derive(Debug)]
pub enum CacheEvent<K> {
    /// A read hit this key; credit it for recency
    Promote(K),
}

/// Spawns the worker that drains the event queue serially.
///
/// Promotions go through the store's own lock, so a dropped or late
/// event leaves recency at most slightly stale, never the list
/// corrupted. The worker exits when the cache drops its sender.
pub fn spawn_event_worker<K, V>(
    store: Arc<dyn EvictionStore<K, V>>,
    mut events: mpsc::Receiver<CacheEvent<K>>,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                CacheEvent::Promote(key) => store.mark_recently_used(&key),
            }
        }
        debug!("event channel closed, recency worker exiting");
    })
}
