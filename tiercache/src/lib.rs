//! Two-tier in-process caching engine: a bounded LRU L1 in front of a
//! TTL-bounded L2, with compute-on-miss, request coalescing, warming,
//! invalidation, and hit/miss accounting.

pub mod config;
pub mod core;

// Re-export commonly used types
pub use config::CacheConfig;
pub use core::{CacheError, CacheStats, L1Store, L2Store, Result, StoredValue, TieredCache};
