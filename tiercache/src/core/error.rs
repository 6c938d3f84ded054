use std::sync::Arc;
use thiserror::Error;

/// Main error type for cache operations
///
/// Cloneable so that a single compute outcome can be handed to every caller
/// that collapsed onto the same in-flight computation.
#[derive(Debug, Error, Clone)]
pub enum CacheError {
    /// The caller-supplied compute function failed. The failure is surfaced
    /// verbatim and is never stored in either tier.
    #[error("compute function failed: {0}")]
    Compute(Arc<anyhow::Error>),

    /// Rejected configuration, raised at construction rather than first use.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    pub(crate) fn compute(err: anyhow::Error) -> Self {
        Self::Compute(Arc::new(err))
    }

    /// Whether this error originated in a caller-supplied compute function.
    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Compute(_))
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
