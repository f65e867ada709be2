//! Error types for the loading cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error type accepted from loader functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// The enum is cloneable so a single load outcome can be fanned out to
/// every caller coalesced behind the same in-flight load.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// No loader function was configured at construction time
    #[error("no loader configured")]
    LoaderMissing,

    /// The loader returned an error; delivered verbatim to all waiters
    #[error("load failed: {0}")]
    Load(Arc<dyn std::error::Error + Send + Sync>),

    /// The in-flight load was dropped before producing a result
    #[error("in-flight load abandoned")]
    LoadAbandoned,
}

impl CacheError {
    /// Wraps a loader error for fan-out to coalesced waiters.
    pub fn load(err: BoxError) -> Self {
        CacheError::Load(Arc::from(err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
