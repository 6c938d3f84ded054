use super::error::{CacheError, Result};
use super::l1::L1Store;
use super::l2::L2Store;
use super::types::CacheStats;
use crate::config::CacheConfig;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Shared outcome of one in-flight computation; every caller that collapsed
/// onto the key awaits the same cell and clones the same result.
type Flight<V> = Arc<OnceCell<Result<V>>>;

/// Two-tier cache with compute-on-miss
///
/// Lookups check the bounded LRU L1 tier first, then the TTL-bounded L2 tier
/// (promoting hits back into L1), and finally fall through to a
/// caller-supplied compute function whose result populates both tiers.
/// Concurrent misses on the same key collapse onto a single computation.
///
/// The handle is cheap to clone; clones share tiers, statistics, and the
/// in-flight table.
#[derive(Clone)]
pub struct TieredCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    l1: Arc<RwLock<L1Store<K, V>>>,
    l2: Arc<RwLock<L2Store<K, V>>>,
    in_flight: Arc<Mutex<HashMap<K, Flight<V>>>>,
    stats: Arc<RwLock<CacheStats>>,
    config: CacheConfig,
}

impl<K, V> TieredCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache from a validated configuration
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "initializing tiered cache: l1_capacity={}, l2_ttl={:?}",
            config.l1_capacity,
            config.l2_ttl()
        );

        Ok(Self {
            l1: Arc::new(RwLock::new(L1Store::new(config.l1_capacity))),
            l2: Arc::new(RwLock::new(L2Store::new(config.l2_ttl()))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheStats::new())),
            config,
        })
    }

    /// Create a new cache with the given L1 capacity and L2 time-to-live
    ///
    /// A TTL beyond `u64::MAX` milliseconds saturates rather than wrapping.
    pub fn with_capacity_and_ttl(l1_capacity: usize, l2_ttl: Duration) -> Result<Self> {
        Self::new(CacheConfig {
            l1_capacity,
            l2_ttl_ms: u64::try_from(l2_ttl.as_millis()).unwrap_or(u64::MAX),
            ..CacheConfig::default()
        })
    }

    /// Look up a key, computing and caching the value on a miss
    ///
    /// The compute function runs without any cache lock held, so slow
    /// computations for different keys proceed in parallel. Concurrent
    /// callers for the same missing key trigger at most one computation;
    /// the others wait for it and receive the same result, including a
    /// failure. Failures are propagated and never cached.
    pub async fn get<F, Fut>(&self, key: &K, compute: F) -> Result<V>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        let l1_hit = self.l1.write().get(key);
        if let Some(value) = l1_hit {
            self.stats.write().record_l1_hit();
            debug!("l1 hit");
            return Ok(value);
        }

        let l2_hit = self.l2.write().get(key);
        if let Some(value) = l2_hit {
            self.stats.write().record_l2_hit();
            debug!("l2 hit, promoting");
            self.promote(key.clone(), value.clone());
            return Ok(value);
        }

        self.stats.write().record_miss();
        debug!("miss, deferring to compute");

        // Join an in-flight computation for this key or become its leader.
        let cell = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(key) {
                Some(cell) => cell.clone(),
                None => {
                    let cell: Flight<V> = Arc::new(OnceCell::new());
                    in_flight.insert(key.clone(), cell.clone());
                    cell
                }
            }
        };

        let key_owned = key.clone();
        let result = cell
            .get_or_init(|| async move {
                // A computation that finished between our tier lookups and
                // the marker install may already have populated the tiers.
                let recheck = self.l1.write().get(&key_owned);
                if let Some(value) = recheck {
                    return Ok(value);
                }
                let recheck = self.l2.write().get(&key_owned);
                if let Some(value) = recheck {
                    self.promote(key_owned.clone(), value.clone());
                    return Ok(value);
                }

                match compute(key_owned.clone()).await {
                    Ok(value) => {
                        self.insert_both(key_owned, value.clone());
                        Ok(value)
                    }
                    Err(err) => Err(CacheError::compute(err)),
                }
            })
            .await
            .clone();

        // Drop the marker once the outcome is settled so a later independent
        // miss computes afresh. Late waiters still hold the cell via its Arc.
        {
            let mut in_flight = self.in_flight.lock();
            if in_flight
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(key);
            }
        }

        result
    }

    /// Remove a key from both tiers
    ///
    /// Idempotent; invalidating an absent key is a no-op. An in-flight
    /// computation for the key is not cancelled.
    pub fn invalidate(&self, key: &K) {
        let l1_removed = self.l1.write().delete(key);
        let l2_removed = self.l2.write().delete(key);
        if l1_removed || l2_removed {
            debug!("invalidated key");
        }
    }

    /// Populate the cache for a batch of keys
    ///
    /// Each key goes through the regular lookup path and results are
    /// discarded. Failures are collected per key and do not stop the
    /// remaining keys from warming.
    pub async fn warm<F, Fut>(&self, keys: Vec<K>, compute: F) -> Vec<(K, CacheError)>
    where
        F: Fn(K) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        info!("warming cache with {} keys", keys.len());

        let mut failures = Vec::new();
        for key in keys {
            if let Err(err) = self.get(&key, &compute).await {
                failures.push((key, err));
            }
        }

        if !failures.is_empty() {
            debug!("cache warming finished with {} failures", failures.len());
        }
        failures
    }

    /// Snapshot of the cumulative counters
    ///
    /// The snapshot is eventually consistent with concurrent lookups.
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Zero all counters
    pub fn reset_stats(&self) {
        self.stats.write().reset();
    }

    /// Remove expired L2 entries now, returning how many were dropped
    pub fn sweep(&self) -> usize {
        self.l2.write().sweep(Instant::now())
    }

    /// Start the periodic L2 sweep task
    pub fn start_sweep(&self) -> tokio::task::JoinHandle<()> {
        let interval_ms = self.config.sweep_interval_ms;
        info!("starting l2 sweep task (interval={}ms)", interval_ms);

        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));

            loop {
                interval.tick().await;
                cache.sweep();
            }
        })
    }

    /// Current (L1, L2) entry counts
    pub fn tier_sizes(&self) -> (usize, usize) {
        (self.l1.read().len(), self.l2.read().len())
    }

    /// Remove every entry from both tiers, leaving counters untouched
    pub fn clear(&self) {
        self.l1.write().clear();
        self.l2.write().clear();
        debug!("cleared both tiers");
    }

    /// Active configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn promote(&self, key: K, value: V) {
        if self.l1.write().put(key, value).is_some() {
            self.stats.write().record_eviction();
        }
    }

    fn insert_both(&self, key: K, value: V) {
        self.l2.write().put(key.clone(), value.clone());
        if self.l1.write().put(key, value).is_some() {
            self.stats.write().record_eviction();
        }
    }
}
