//! Loading Cache Module
//!
//! The public cache API: load-on-miss through the call coalescer,
//! time-based expiration, asynchronous refresh-after-write, and LRU
//! bookkeeping over a pluggable eviction store.

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::cache::coalesce::Coalescer;
use crate::cache::entry::{current_timestamp_ms, CacheEntry};
use crate::cache::lock_guard;
use crate::cache::lru::{EvictionStore, LruStore};
use crate::cache::policy::ExpiryPolicy;
use crate::cache::stats::{CacheStats, StatsCounter};
use crate::config::CacheConfig;
use crate::error::{BoxError, CacheError, Result};
use crate::tasks::{spawn_event_worker, spawn_sweep_task, CacheEvent};

// == Loader ==
/// Future returned by one loader invocation.
pub type LoaderFuture<V> = Pin<Box<dyn Future<Output = std::result::Result<V, BoxError>> + Send>>;

/// Externally supplied value loader.
///
/// Must tolerate concurrent calls for different keys; the coalescer
/// suppresses duplicate calls per key. The cache never interrupts an
/// in-flight load, so the loader is responsible for bounding its own
/// execution time.
pub type Loader<K, V> = Arc<dyn Fn(K) -> LoaderFuture<V> + Send + Sync>;

/// State shared between the public handle, background workers and
/// spawned refreshes.
struct CacheInner<K, V> {
    store: Arc<dyn EvictionStore<K, V>>,
    loader: Loader<K, V>,
    coalescer: Coalescer<K, V>,
    policy: ExpiryPolicy,
    /// Keys with an outstanding background refresh
    refreshing: Mutex<HashSet<K>>,
    stats: Arc<StatsCounter>,
    events: mpsc::Sender<CacheEvent<K>>,
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Load ==
    /// Leader side of a coalesced load: invoke the loader, time it, and
    /// install the result. A replaced stale entry is superseded in
    /// place; only a capacity displacement counts as an eviction.
    async fn load_value(inner: Arc<Self>, key: K) -> Result<V> {
        let started = Instant::now();
        match (inner.loader)(key.clone()).await {
            Ok(value) => {
                let entry = Arc::new(CacheEntry::new(key, value.clone()));
                if inner.store.add(entry).is_some() {
                    inner.stats.record_eviction();
                    debug!("capacity eviction after load");
                }
                inner.stats.record_load_success(started.elapsed());
                Ok(value)
            }
            Err(err) => {
                inner.stats.record_load_error(started.elapsed());
                warn!(error = %err, "loader call failed");
                Err(CacheError::load(err))
            }
        }
    }

    // == Refresh ==
    /// Background stale-while-revalidate: readers keep the old value
    /// until the reload lands in the entry. Goes through the coalescer,
    /// so a racing read-triggered load and this refresh cannot both run
    /// the loader.
    async fn refresh_entry(inner: Arc<Self>, entry: Arc<CacheEntry<K, V>>) {
        let key = entry.key().clone();
        let flight = {
            let inner = Arc::clone(&inner);
            let entry = Arc::clone(&entry);
            let key = key.clone();
            async move {
                let started = Instant::now();
                match (inner.loader)(key).await {
                    Ok(value) => {
                        entry.store_value(value.clone());
                        inner.stats.record_load_success(started.elapsed());
                        Ok(value)
                    }
                    Err(err) => {
                        inner.stats.record_load_error(started.elapsed());
                        Err(CacheError::load(err))
                    }
                }
            }
        };

        if let Err(err) = inner.coalescer.execute(&key, flight).await {
            // Best effort: the stale entry stays served; a later read
            // retries once the key is unmarked below.
            warn!(error = %err, "background refresh failed");
        }
        lock_guard(&inner.refreshing).remove(&key);
    }
}

// == Loading Cache ==
/// In-process loading cache.
///
/// `get` serves fresh hits from memory, coalesces concurrent loads for
/// the same key, and refreshes aging entries in the background while
/// still serving the stale value. Construction goes through
/// [`LoadingCache::builder`]; background workers are owned by the
/// instance and stopped when it is dropped.
pub struct LoadingCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
    event_worker: JoinHandle<()>,
    sweeper: Option<JoinHandle<()>>,
}

impl<K, V> LoadingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Starts configuring a new cache.
    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::new()
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss or once the
    /// entry has expired. Fresh hits never touch the loader.
    pub async fn get(&self, key: &K) -> Result<V> {
        self.lookup(key, |_: &V| false).await
    }

    /// Like [`LoadingCache::get`], additionally treating the entry as
    /// stale whenever `is_stale` returns true for the current value.
    pub async fn get_with_check<F>(&self, key: &K, is_stale: F) -> Result<V>
    where
        F: Fn(&V) -> bool,
    {
        self.lookup(key, is_stale).await
    }

    async fn lookup<F>(&self, key: &K, is_stale: F) -> Result<V>
    where
        F: Fn(&V) -> bool,
    {
        let inner = &self.inner;

        let entry = match inner.store.get(key) {
            Some(entry) => entry,
            None => {
                inner.stats.record_misses(1);
                return self.load(key).await;
            }
        };

        let value = entry.value();
        let now = current_timestamp_ms();
        if is_stale(&value) || inner.policy.is_expired(&entry, now) {
            // The superseding load replaces the entry in place; it never
            // leaves the store while the reload is in flight.
            inner.stats.record_misses(1);
            return self.load(key).await;
        }

        self.maybe_refresh(&entry, now);
        entry.touch();
        inner.stats.record_hits(1);
        self.promote(key);
        Ok(value)
    }

    // == Put ==
    /// Unconditional upsert.
    ///
    /// Overwriting an existing key replaces the value in place and
    /// resets the write time, so expiry and refresh windows restart
    /// from the put.
    pub fn put(&self, key: K, value: V) {
        if let Some(entry) = self.inner.store.get(&key) {
            entry.store_value(value);
            self.inner.store.mark_recently_used(&key);
            return;
        }
        let entry = Arc::new(CacheEntry::new(key, value));
        if self.inner.store.add(entry).is_some() {
            self.inner.stats.record_eviction();
            debug!("capacity eviction after put");
        }
    }

    // == Remove ==
    /// Removes `key` if present; absent keys are a silent no-op.
    pub fn remove(&self, key: &K) {
        let _ = self.inner.store.remove(key);
    }

    // == Stats ==
    /// Point-in-time copy of the performance counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Visits every entry in recency order (most recent first) under
    /// the store's guard. Diagnostic; touches neither recency nor stats.
    pub fn for_each_entry(&self, mut f: impl FnMut(&K, V)) {
        self.inner
            .store
            .for_each(&mut |entry| f(entry.key(), entry.value()));
    }

    /// Delegates the miss/stale path to the coalescer so concurrent
    /// callers for the same key share one loader invocation.
    async fn load(&self, key: &K) -> Result<V> {
        let inner = Arc::clone(&self.inner);
        let owned = key.clone();
        self.inner
            .coalescer
            .execute(key, async move { CacheInner::load_value(inner, owned).await })
            .await
    }

    /// Launches a background refresh when the entry's write has aged
    /// past the refresh window and no refresh for the key is already
    /// outstanding.
    fn maybe_refresh(&self, entry: &Arc<CacheEntry<K, V>>, now_ms: u64) {
        let inner = &self.inner;
        if !inner.policy.needs_refresh(entry, now_ms) {
            return;
        }
        {
            let mut refreshing = lock_guard(&inner.refreshing);
            if !refreshing.insert(entry.key().clone()) {
                return;
            }
        }
        let inner = Arc::clone(inner);
        let entry = Arc::clone(entry);
        tokio::spawn(CacheInner::refresh_entry(inner, entry));
    }

    /// Queues an asynchronous move-to-front for a hit. Dropping the
    /// promotion under backpressure degrades recency accuracy only; the
    /// counters have already been updated synchronously.
    fn promote(&self, key: &K) {
        if self
            .inner
            .events
            .try_send(CacheEvent::Promote(key.clone()))
            .is_err()
        {
            trace!("promotion queue full, dropping recency update");
        }
    }
}

impl<K, V> Drop for LoadingCache<K, V> {
    fn drop(&mut self) {
        self.event_worker.abort();
        if let Some(sweeper) = &self.sweeper {
            sweeper.abort();
        }
    }
}

// == Cache Builder ==
/// Configures and constructs a [`LoadingCache`].
///
/// A loader is mandatory; everything else defaults to unbounded
/// capacity, no expiry and no refresh.
pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    loader: Option<Loader<K, V>>,
    store: Option<Arc<dyn EvictionStore<K, V>>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a builder with default settings and no loader.
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            loader: None,
            store: None,
        }
    }

    /// Maximum entry count; [`crate::cache::UNBOUNDED`] disables
    /// eviction.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Expire entries not read within `window`. Zero disables the check.
    pub fn expire_after_access(mut self, window: Duration) -> Self {
        self.config.expire_after_access = window;
        self
    }

    /// Expire entries not written within `window`. Zero disables the
    /// check.
    pub fn expire_after_write(mut self, window: Duration) -> Self {
        self.config.expire_after_write = window;
        self
    }

    /// Refresh entries in the background once their write is older than
    /// `window`, serving the stale value until the reload completes.
    /// Zero disables refresh.
    pub fn refresh_after_write(mut self, window: Duration) -> Self {
        self.config.refresh_after_write = window;
        self
    }

    /// Bound of the recency-promotion event queue.
    pub fn event_buffer(mut self, size: usize) -> Self {
        self.config.event_buffer = size;
        self
    }

    /// Sets the mandatory value loader.
    pub fn loader<F, Fut>(mut self, load: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, BoxError>> + Send + 'static,
    {
        self.loader = Some(Arc::new(move |key| -> LoaderFuture<V> {
            Box::pin(load(key))
        }));
        self
    }

    /// Substitutes a custom eviction store; defaults to an [`LruStore`]
    /// with the configured capacity.
    pub fn eviction_store(mut self, store: Arc<dyn EvictionStore<K, V>>) -> Self {
        self.store = Some(store);
        self
    }

    // == Build ==
    /// Builds the cache and starts its background workers.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`CacheError::LoaderMissing`] when no loader was supplied.
    pub fn build(self) -> Result<LoadingCache<K, V>> {
        let loader = self.loader.ok_or(CacheError::LoaderMissing)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(LruStore::new(self.config.capacity)));
        let policy = ExpiryPolicy {
            expire_after_access: self.config.expire_after_access,
            expire_after_write: self.config.expire_after_write,
            refresh_after_write: self.config.refresh_after_write,
        };

        let (events, event_rx) = mpsc::channel(self.config.event_buffer.max(1));
        let inner = Arc::new(CacheInner {
            store,
            loader,
            coalescer: Coalescer::new(),
            policy,
            refreshing: Mutex::new(HashSet::new()),
            stats: Arc::new(StatsCounter::new()),
            events,
        });

        let event_worker = spawn_event_worker(Arc::clone(&inner.store), event_rx);
        let sweeper = policy.sweep_interval().map(|every| {
            spawn_sweep_task(
                Arc::clone(&inner.store),
                policy,
                Arc::clone(&inner.stats),
                every,
            )
        });

        Ok(LoadingCache {
            inner,
            event_worker,
            sweeper,
        })
    }
}

impl<K, V> Default for CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_loader() -> impl Fn(String) -> LoaderFuture<String> + Send + Sync + 'static {
        |key: String| Box::pin(async move { Ok(format!("value_{key}")) }) as LoaderFuture<String>
    }

    #[tokio::test]
    async fn test_builder_requires_loader() {
        let result: Result<LoadingCache<String, String>> = LoadingCache::builder().build();
        assert!(matches!(result, Err(CacheError::LoaderMissing)));
    }

    #[tokio::test]
    async fn test_get_loads_on_miss() {
        let cache = LoadingCache::builder()
            .loader(|key: String| async move { Ok(format!("value_{key}")) })
            .build()
            .unwrap();

        let value = cache.get(&"k".to_string()).await.unwrap();
        assert_eq!(value, "value_k");
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.load_success, 1);
    }

    #[tokio::test]
    async fn test_second_get_is_a_hit() {
        let cache = LoadingCache::builder()
            .loader(|key: String| async move { Ok(format!("value_{key}")) })
            .build()
            .unwrap();

        cache.get(&"k".to_string()).await.unwrap();
        let value = cache.get(&"k".to_string()).await.unwrap();

        assert_eq!(value, "value_k");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.load_success, 1);
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let cache = LoadingCache::builder()
            .loader(|_key: String| async move { Ok("loaded".to_string()) })
            .build()
            .unwrap();

        cache.put("k".to_string(), "stored".to_string());
        let value = cache.get(&"k".to_string()).await.unwrap();

        // The put value is served; the loader is never consulted
        assert_eq!(value, "stored");
        assert_eq!(cache.stats().load_success, 0);
    }

    #[tokio::test]
    async fn test_remove_is_silent_and_forces_reload() {
        let cache = LoadingCache::builder()
            .loader(|key: String| async move { Ok(format!("value_{key}")) })
            .build()
            .unwrap();

        // Removing an absent key is a no-op
        cache.remove(&"k".to_string());

        cache.put("k".to_string(), "stored".to_string());
        cache.remove(&"k".to_string());
        assert!(cache.is_empty());

        let value = cache.get(&"k".to_string()).await.unwrap();
        assert_eq!(value, "value_k");
    }

    #[tokio::test]
    async fn test_custom_store_is_used() {
        let store: Arc<LruStore<String, String>> = Arc::new(LruStore::new(1));
        let cache = LoadingCache::builder()
            .eviction_store(store.clone())
            .loader(lookup_loader())
            .build()
            .unwrap();

        cache.get(&"a".to_string()).await.unwrap();
        cache.get(&"b".to_string()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_for_each_entry_sees_all() {
        let cache = LoadingCache::builder()
            .loader(lookup_loader())
            .build()
            .unwrap();

        cache.put("a".to_string(), "1".to_string());
        cache.put("b".to_string(), "2".to_string());

        let mut seen = Vec::new();
        cache.for_each_entry(|key, value| seen.push((key.clone(), value)));
        seen.sort();

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }
}
