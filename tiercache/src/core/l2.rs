use super::types::StoredValue;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

/// TTL-bounded store, the warm tier of the cache
///
/// Entries expire a fixed duration after insertion. Expiry is evaluated at
/// read time; an expired entry is logically absent before it is physically
/// removed. `sweep` is the amortized cleanup path that bounds memory growth.
pub struct L2Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    ttl: Duration,
    entries: HashMap<K, StoredValue<V>>,
}

impl<K, V> L2Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new store whose entries live for `ttl` after insertion
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Get a value if present and not expired
    ///
    /// An expired entry is removed lazily and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let is_expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return None,
        };

        if is_expired {
            self.entries.remove(key);
            debug!("l2 entry expired");
            return None;
        }

        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite with a fresh insertion timestamp
    pub fn put(&mut self, key: K, value: V) {
        self.entries.insert(key, StoredValue::new(value, self.ttl));
    }

    /// Remove a key, reporting whether it was present
    pub fn delete(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry expired as of `now`, returning how many were dropped
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("l2 sweep removed {} expired entries", removed);
        }
        removed
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current number of entries, counting not-yet-swept expired ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
