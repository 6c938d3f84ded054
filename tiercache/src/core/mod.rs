pub mod cache;
pub mod error;
pub mod l1;
pub mod l2;
pub mod types;

pub use cache::TieredCache;
pub use error::{CacheError, Result};
pub use l1::L1Store;
pub use l2::L2Store;
pub use types::{CacheStats, StoredValue};
