//! Call Coalescing Module
//!
//! Deduplicates concurrent loads for the same key: one leader runs the
//! load and every concurrent caller for that key receives the same
//! outcome.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

use tokio::sync::watch;

use crate::cache::lock_guard;
use crate::error::{CacheError, Result};

/// Completion slot shared by one in-flight call.
type FlightReceiver<V> = watch::Receiver<Option<Result<V>>>;

// == Coalescer ==
/// Single-flight gate over an arbitrary async load.
///
/// The pending-call map is locked only for registration and removal,
/// never across the load itself. An error outcome is handed to every
/// waiter verbatim and does not poison the key: the next call after
/// completion starts a fresh attempt.
#[derive(Debug)]
pub struct Coalescer<K, V> {
    flights: Mutex<HashMap<K, FlightReceiver<V>>>,
}

impl<K, V> Default for Coalescer<K, V> {
    fn default() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }
}

/// What a caller turned out to be for a given key.
enum Role<V> {
    Leader(watch::Sender<Option<Result<V>>>),
    Follower(FlightReceiver<V>),
}

impl<K, V> Coalescer<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a coalescer with no calls in flight.
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }

    // == Execute ==
    /// Runs `load` unless a call for `key` is already in flight, in
    /// which case the caller waits for that call's outcome instead.
    ///
    /// The leader polls `load` on its own task; followers never touch
    /// it. If the leader is dropped before completing, the flight is
    /// unregistered and followers observe [`CacheError::LoadAbandoned`].
    pub async fn execute<F>(&self, key: &K, load: F) -> Result<V>
    where
        F: Future<Output = Result<V>>,
    {
        let role = {
            let mut flights = lock_guard(&self.flights);
            match flights.get(key) {
                Some(rx) => Role::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    flights.insert(key.clone(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Follower(mut rx) => match rx.wait_for(|slot| slot.is_some()).await {
                Ok(slot) => (*slot).clone().unwrap_or(Err(CacheError::LoadAbandoned)),
                Err(_) => Err(CacheError::LoadAbandoned),
            },
            Role::Leader(tx) => {
                let _guard = FlightGuard {
                    flights: &self.flights,
                    key,
                };
                let outcome = load.await;
                // Publish before the guard unregisters the flight, so a
                // follower that grabbed the receiver always finds the slot
                // filled.
                let _ = tx.send(Some(outcome.clone()));
                outcome
            }
        }
    }
}

/// Unregisters the pending record when the leader finishes or is
/// dropped mid-load.
struct FlightGuard<'a, K: Eq + Hash, V> {
    flights: &'a Mutex<HashMap<K, FlightReceiver<V>>>,
    key: &'a K,
}

impl<K: Eq + Hash, V> Drop for FlightGuard<'_, K, V> {
    fn drop(&mut self) {
        lock_guard(self.flights).remove(self.key);
    }
}
