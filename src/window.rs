//! Rolling window tracker
//!
//! Per-key timestamp buffers used for every rate/count condition: scrolls per
//! domain, tab switches, typing and deleting buckets, and the detected
//! typing/deleting patterns. Windows live in memory only.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Default retention horizon (one hour)
pub const DEFAULT_RETENTION_MS: i64 = 60 * 60 * 1000;

/// Time-stamped event accumulator keyed by `K`
#[derive(Debug, Clone)]
pub struct RollingWindow<K> {
    entries: HashMap<K, VecDeque<i64>>,
    horizon_ms: i64,
}

impl<K: Eq + Hash + Clone> Default for RollingWindow<K> {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_MS)
    }
}

impl<K: Eq + Hash + Clone> RollingWindow<K> {
    /// Create a tracker that never keeps entries older than `horizon_ms`
    pub fn new(horizon_ms: i64) -> Self {
        Self {
            entries: HashMap::new(),
            horizon_ms,
        }
    }

    /// Append an event timestamp for `key`, creating the window lazily
    pub fn record(&mut self, key: K, timestamp_ms: i64) {
        self.entries.entry(key).or_default().push_back(timestamp_ms);
    }

    /// Number of stored timestamps with `now - t < window_ms`.
    ///
    /// Entries past the retention horizon are dropped first.
    pub fn count_within(&mut self, key: &K, window_ms: i64, now_ms: i64) -> usize {
        let horizon = self.horizon_ms;
        let Some(timestamps) = self.entries.get_mut(key) else {
            return 0;
        };
        timestamps.retain(|&t| now_ms - t < horizon);
        timestamps.iter().filter(|&&t| now_ms - t < window_ms).count()
    }

    /// Drop entries with `now - t >= horizon_ms` for every key, and empty keys
    pub fn prune(&mut self, horizon_ms: i64, now_ms: i64) {
        for timestamps in self.entries.values_mut() {
            timestamps.retain(|&t| now_ms - t < horizon_ms);
        }
        self.entries.retain(|_, timestamps| !timestamps.is_empty());
    }

    /// Forget everything recorded for `key`
    pub fn clear_key(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Forget every key
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of keys with at least one stored timestamp
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Total stored timestamps across keys
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }

    /// Oldest stored timestamp across all keys
    pub fn oldest(&self) -> Option<i64> {
        self.entries
            .values()
            .filter_map(|timestamps| timestamps.iter().min().copied())
            .min()
    }
}
