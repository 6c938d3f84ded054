use serde::Serialize;
use std::time::{Duration, Instant};

/// Value held by the L2 tier with expiry metadata
#[derive(Debug, Clone)]
pub struct StoredValue<V> {
    /// The cached value, treated as an immutable snapshot
    pub value: V,
    /// When the value was inserted
    pub created_at: Instant,
    /// Absolute expiration time
    pub expires_at: Instant,
}

impl<V> StoredValue<V> {
    /// Create a new stored value expiring `ttl` from now
    ///
    /// A TTL too large to represent as an `Instant` saturates to roughly a
    /// century out instead of overflowing.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64));
        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Check if the value has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Check expiry against an explicit clock reading
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Get remaining time before expiry
    pub fn remaining_ttl(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Cumulative counters for the tiered cache
///
/// Counters only grow until `reset` is called explicitly.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups satisfied by the L1 tier
    pub l1_hits: u64,
    /// Lookups satisfied by the L2 tier (followed by promotion)
    pub l2_hits: u64,
    /// Lookups that fell through to the compute function
    pub misses: u64,
    /// Entries pushed out of L1 by capacity pressure
    pub evictions: u64,
    /// Fraction of lookups served without computing
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_l1_hit(&mut self) {
        self.l1_hits += 1;
        self.update_hit_rate();
    }

    pub fn record_l2_hit(&mut self) {
        self.l2_hits += 1;
        self.update_hit_rate();
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.update_hit_rate();
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Total number of lookups observed
    pub fn lookups(&self) -> u64 {
        self.l1_hits + self.l2_hits + self.misses
    }

    fn update_hit_rate(&mut self) {
        let total = self.lookups();
        if total > 0 {
            self.hit_rate = (self.l1_hits + self.l2_hits) as f64 / total as f64;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
