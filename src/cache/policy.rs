//! Expiration Policy Module
//!
//! Time thresholds for expiry and refresh, and the cadence of the
//! background sweep derived from them.

use std::time::Duration;

use crate::cache::entry::CacheEntry;

// == Expiry Policy ==
/// Time-based freshness rules.
///
/// A zero duration disables the corresponding check; the two expiry
/// windows are an independent disjunction, either one expires an entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiryPolicy {
    /// Expire entries not read within this window
    pub expire_after_access: Duration,
    /// Expire entries not written within this window
    pub expire_after_write: Duration,
    /// Refresh entries in the background once their write is older than this
    pub refresh_after_write: Duration,
}

impl ExpiryPolicy {
    /// True when either configured expiry threshold has elapsed.
    ///
    /// Boundary condition: an entry whose threshold has exactly elapsed
    /// is expired.
    pub fn is_expired<K, V>(&self, entry: &CacheEntry<K, V>, now_ms: u64) -> bool {
        threshold_elapsed(self.expire_after_access, entry.accessed_ms(), now_ms)
            || threshold_elapsed(self.expire_after_write, entry.written_ms(), now_ms)
    }

    /// True when the entry is due for a background refresh.
    pub fn needs_refresh<K, V>(&self, entry: &CacheEntry<K, V>, now_ms: u64) -> bool {
        threshold_elapsed(self.refresh_after_write, entry.written_ms(), now_ms)
    }

    /// Cadence for the background sweep: the smaller configured expiry
    /// window, or `None` when neither window is set.
    pub fn sweep_interval(&self) -> Option<Duration> {
        min_duration_exclude_zero(self.expire_after_access, self.expire_after_write)
    }
}

fn threshold_elapsed(threshold: Duration, stamp_ms: u64, now_ms: u64) -> bool {
    !threshold.is_zero() && now_ms.saturating_sub(stamp_ms) >= threshold.as_millis() as u64
}

/// Smaller of two durations ignoring zero; `None` when both are zero.
fn min_duration_exclude_zero(a: Duration, b: Duration) -> Option<Duration> {
    match (a.is_zero(), b.is_zero()) {
        (true, true) => None,
        (true, false) => Some(b),
        (false, true) => Some(a),
        (false, false) => Some(a.min(b)),
    }
}
