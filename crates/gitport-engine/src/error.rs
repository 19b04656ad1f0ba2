//! Error types for the import engine

use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Main error type for the import engine
///
/// Transport and rate-limit failures propagate out of the page-walk
/// untouched; the outer job infrastructure owns retry and backoff. Cache
/// failures are fatal because dedup and resumability depend on the cache.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The remote API signalled throttling. `reset_in` is how long the
    /// outer supervision layer should wait before relaunching the run.
    #[error("rate limited by source API, resets in {reset_in:?}")]
    RateLimited { reset_in: Duration },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("invalid object: {0}")]
    InvalidObject(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by the cache layer
///
/// There is no degraded cache-less mode; callers treat these as fatal for
/// the current run. The run stays resumable through the state already in
/// the store.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}
