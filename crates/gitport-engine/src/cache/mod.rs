//! Import cache facade
//!
//! Namespaced TTL key/value and set operations backing the page cursor,
//! dedup tracker and object counter. All physical keys have the shape
//! `{namespace}/{logical-key}` so two import deployments sharing one store
//! never collide.
//!
//! Reading a present, non-empty value refreshes its lifetime to the
//! default timeout. That keeps hot cursors and dedup sets alive over a
//! long-running import without a keep-alive heartbeat, while state left
//! behind by crashed runs ages out on its own. Empty values and misses do
//! not refresh.

pub mod store;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ImportConfig;
use crate::error::CacheError;

pub use store::{CacheStore, MemoryStore};

type Result<T> = std::result::Result<T, CacheError>;

/// Result of a cache read
///
/// The three states are distinct on purpose: an empty value means
/// "checked, found nothing" and must not be confused with a miss, and
/// only `Present` values have their lifetime refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Key is not in the store (or has expired)
    Absent,
    /// Key exists with an empty value
    PresentEmpty,
    /// Key exists with a non-empty value
    Present(String),
}

impl ReadOutcome {
    /// The non-empty value, if any
    pub fn value(self) -> Option<String> {
        match self {
            ReadOutcome::Present(value) => Some(value),
            _ => None,
        }
    }
}

/// Namespaced cache client shared by the engine's components
///
/// Constructed once per process from an explicit store handle and passed
/// down; components never reach for a global.
pub struct ImportCache {
    store: Arc<dyn CacheStore>,
    namespace: String,
    default_timeout: Duration,
}

impl ImportCache {
    pub fn new(store: Arc<dyn CacheStore>, config: &ImportConfig) -> Self {
        Self {
            store,
            namespace: config.namespace.clone(),
            default_timeout: config.cache_timeout(),
        }
    }

    /// The default lifetime applied to writes and read-refreshes
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }

    /// Read a key, refreshing its lifetime when a non-empty value is hit
    pub async fn read(&self, key: &str) -> Result<ReadOutcome> {
        let physical = self.cache_key(key);

        match self.store.get(&physical).await? {
            None => Ok(ReadOutcome::Absent),
            Some(value) if value.is_empty() => Ok(ReadOutcome::PresentEmpty),
            Some(value) => {
                self.store.expire(&physical, self.default_timeout).await?;
                Ok(ReadOutcome::Present(value))
            }
        }
    }

    /// Read a key as a string; misses and blank values are `None`
    pub async fn read_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read(key).await?.value())
    }

    /// Read a key as an integer; misses, blank and unparsable values are
    /// `None`
    pub async fn read_integer(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .read(key)
            .await?
            .value()
            .and_then(|value| value.trim().parse().ok()))
    }

    /// Write a stringified value, returning it for fluent use
    pub async fn write(
        &self,
        key: &str,
        value: impl ToString,
        timeout: Duration,
    ) -> Result<String> {
        let value = value.to_string();
        self.store
            .set(&self.cache_key(key), &value, timeout)
            .await?;
        Ok(value)
    }

    /// Write with the default timeout
    pub async fn write_default(&self, key: &str, value: impl ToString) -> Result<String> {
        self.write(key, value, self.default_timeout).await
    }

    /// Write many keys in a single store round trip
    pub async fn write_multiple(&self, entries: &[(&str, String)]) -> Result<()> {
        let batch: Vec<(String, String)> = entries
            .iter()
            .map(|(key, value)| (self.cache_key(key), value.clone()))
            .collect();
        self.store.set_many(&batch, self.default_timeout).await
    }

    /// Add a member to a set key. Returns true if it was newly added.
    pub async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        self.store
            .sadd(&self.cache_key(key), member, self.default_timeout)
            .await
    }

    /// Membership test against a set key
    pub async fn set_includes(&self, key: &str, member: &str) -> Result<bool> {
        self.store.sismember(&self.cache_key(key), member).await
    }

    /// Atomically add `delta` to a numeric key, returning the new value
    pub async fn increment_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.store
            .incr_by(&self.cache_key(key), delta, self.default_timeout)
            .await
    }

    /// Conditionally advance a numeric key. Absent keys accept any value;
    /// present keys only a strictly greater one.
    pub async fn write_if_greater(&self, key: &str, value: u64) -> Result<bool> {
        self.store
            .write_if_greater(&self.cache_key(key), value, self.default_timeout)
            .await
    }

    /// Bound the lifetime of an existing key
    pub async fn expire(&self, key: &str, timeout: Duration) -> Result<()> {
        self.store.expire(&self.cache_key(key), timeout).await
    }
}
