use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tiercache::{CacheConfig, CacheError, TieredCache};
use tokio::sync::Barrier;

fn test_cache(l1_capacity: usize, l2_ttl: Duration) -> TieredCache<String, u64> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    TieredCache::with_capacity_and_ttl(l1_capacity, l2_ttl).unwrap()
}

#[tokio::test]
async fn test_end_to_end_lookup_flow() {
    let cache = test_cache(2, Duration::from_secs(1));
    let calls = Arc::new(AtomicUsize::new(0));

    let compute_calls = calls.clone();
    let value = cache
        .get(&"x".to_string(), move |_key| async move {
            compute_calls.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(42)
        })
        .await
        .unwrap();
    assert_eq!(value, 42);
    assert_eq!(cache.stats().misses, 1);

    let compute_calls = calls.clone();
    let value = cache
        .get(&"x".to_string(), move |_key| async move {
            compute_calls.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(0)
        })
        .await
        .unwrap();
    assert_eq!(value, 42);
    assert_eq!(cache.stats().l1_hits, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_misses_compute_once() {
    let cache = test_cache(16, Duration::from_secs(5));
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(32));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let cache = cache.clone();
        let calls = calls.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            cache
                .get(&"hot".to_string(), move |_key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    anyhow::Ok(99)
                })
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 99);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_waiters_share_failure() {
    let cache = test_cache(16, Duration::from_secs(5));
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        let calls = calls.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            cache
                .get(&"broken".to_string(), move |_key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Err::<u64, _>(anyhow::anyhow!("backend down"))
                })
                .await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(CacheError::Compute(_))));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Nothing was cached by the shared failure
    assert_eq!(cache.tier_sizes(), (0, 0));

    // The settled marker was dropped, so an independent lookup computes
    // afresh and can succeed
    let retry_calls = calls.clone();
    let value = cache
        .get(&"broken".to_string(), move |_key| async move {
            retry_calls.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(7)
        })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_distinct_keys_compute_in_parallel() {
    let cache = test_cache(16, Duration::from_secs(5));
    let compute = |_key: String| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        anyhow::Ok(1)
    };

    let key_a = "a".to_string();
    let key_b = "b".to_string();

    // Virtual time: the runtime only advances the clock while both futures
    // are parked, so two overlapping 100ms computes finish in 100ms while
    // serialized ones would need 200ms.
    let start = tokio::time::Instant::now();
    let (a, b) = tokio::join!(cache.get(&key_a, compute), cache.get(&key_b, compute));
    a.unwrap();
    b.unwrap();

    assert!(start.elapsed() < Duration::from_millis(150));
    assert_eq!(cache.stats().misses, 2);
}

#[tokio::test]
async fn test_warm_then_hits() {
    let cache = test_cache(8, Duration::from_secs(5));
    let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let failures = cache
        .warm(keys.clone(), |key: String| async move {
            anyhow::Ok(key.len() as u64)
        })
        .await;
    assert!(failures.is_empty());
    assert_eq!(cache.stats().misses, 3);

    for key in &keys {
        cache
            .get(key, |_key: String| async move {
                panic!("warmed key must not recompute")
            })
            .await
            .unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.l1_hits, 3);
    assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_background_sweep_bounds_l2() {
    let config = CacheConfig {
        l1_capacity: 4,
        l2_ttl_ms: 50,
        sweep_interval_ms: 20,
    };
    let cache: TieredCache<String, u64> = TieredCache::new(config).unwrap();

    cache
        .get(&"a".to_string(), |_key| async { anyhow::Ok(1) })
        .await
        .unwrap();
    cache
        .get(&"b".to_string(), |_key| async { anyhow::Ok(2) })
        .await
        .unwrap();
    assert_eq!(cache.tier_sizes().1, 2);

    let sweeper = cache.start_sweep();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.tier_sizes().1, 0);
    sweeper.abort();
}

#[tokio::test]
async fn test_clone_handles_share_state() {
    let cache = test_cache(4, Duration::from_secs(5));
    let other = cache.clone();

    cache
        .get(&"shared".to_string(), |_key| async { anyhow::Ok(7) })
        .await
        .unwrap();

    let value = other
        .get(&"shared".to_string(), |_key: String| async move {
            panic!("clone must read the shared tier")
        })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(other.stats().l1_hits, 1);
}

#[tokio::test]
async fn test_invalidate_visible_across_clones() {
    let cache = test_cache(4, Duration::from_secs(5));
    let other = cache.clone();
    let calls = Arc::new(AtomicUsize::new(0));

    let compute_calls = calls.clone();
    cache
        .get(&"k".to_string(), move |_key| async move {
            compute_calls.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(1)
        })
        .await
        .unwrap();

    other.invalidate(&"k".to_string());

    let compute_calls = calls.clone();
    cache
        .get(&"k".to_string(), move |_key| async move {
            compute_calls.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(2)
        })
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stats_snapshot_serializes() {
    let cache = test_cache(4, Duration::from_secs(5));
    cache
        .get(&"a".to_string(), |_key| async { anyhow::Ok(1) })
        .await
        .unwrap();

    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["misses"], 1);
    assert!(json.get("hit_rate").is_some());
}
