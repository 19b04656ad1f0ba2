//! Cache store backends
//!
//! The engine talks to its backing store through the [`CacheStore`] trait
//! so deployments can plug in a shared external store (e.g. Redis) while
//! tests and single-process runs use [`MemoryStore`]. Every operation the
//! scheduler relies on for correctness (`sadd`, `incr_by`,
//! `write_if_greater`) must be atomic in the backend.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

/// Pluggable cache backend
///
/// Keys are opaque strings (already namespaced by the caller). TTLs are
/// mandatory on every write; the engine never stores unbounded keys.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a scalar value. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a scalar value with a lifetime.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Set many scalar values in one round trip where the backend allows
    /// pipelining.
    async fn set_many(&self, entries: &[(String, String)], ttl: Duration) -> Result<()>;

    /// Add a member to a set, refreshing the set's lifetime. Returns true
    /// if the member was not already present.
    async fn sadd(&self, key: &str, member: &str, ttl: Duration) -> Result<bool>;

    /// Membership test against a set key.
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    /// Atomically add `delta` to a numeric key (creating it at zero),
    /// refreshing its lifetime. Returns the new value.
    async fn incr_by(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64>;

    /// Write `value` only if the key is absent or holds a smaller number.
    /// Returns true if the write happened.
    async fn write_if_greater(&self, key: &str, value: u64, ttl: Duration) -> Result<bool>;

    /// Force a lifetime on an existing key. No-op if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
}

enum StoredValue {
    Scalar(String),
    Set(HashSet<String>),
}

struct StoredEntry {
    value: StoredValue,
    deadline: Instant,
}

impl StoredEntry {
    fn live(&self, now: Instant) -> bool {
        self.deadline > now
    }
}

/// In-process store backed by a locked map
///
/// Expiry is lazy: expired entries read as absent and are dropped the next
/// time a write path touches them. Uses `tokio::time::Instant` so tests can
/// drive the clock with a paused runtime.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        Ok(entries.get(key).and_then(|entry| {
            if !entry.live(now) {
                return None;
            }
            match &entry.value {
                StoredValue::Scalar(value) => Some(value.clone()),
                StoredValue::Set(_) => None,
            }
        }))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: StoredValue::Scalar(value.to_string()),
                deadline: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn set_many(&self, batch: &[(String, String)], ttl: Duration) -> Result<()> {
        let deadline = Instant::now() + ttl;
        let mut entries = self.entries.write().await;
        for (key, value) in batch {
            entries.insert(
                key.clone(),
                StoredEntry {
                    value: StoredValue::Scalar(value.clone()),
                    deadline,
                },
            );
        }
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let entry = entries.entry(key.to_string()).or_insert_with(|| StoredEntry {
            value: StoredValue::Set(HashSet::new()),
            deadline: now + ttl,
        });

        // An expired or non-set entry is replaced wholesale.
        if !entry.live(now) || !matches!(entry.value, StoredValue::Set(_)) {
            entry.value = StoredValue::Set(HashSet::new());
        }
        entry.deadline = now + ttl;

        match &mut entry.value {
            StoredValue::Set(members) => Ok(members.insert(member.to_string())),
            StoredValue::Scalar(_) => unreachable!("entry was reset to a set above"),
        }
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        Ok(entries
            .get(key)
            .filter(|entry| entry.live(now))
            .map(|entry| match &entry.value {
                StoredValue::Set(members) => members.contains(member),
                StoredValue::Scalar(_) => false,
            })
            .unwrap_or(false))
    }

    async fn incr_by(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let current = entries
            .get(key)
            .filter(|entry| entry.live(now))
            .and_then(|entry| match &entry.value {
                StoredValue::Scalar(value) => value.parse::<i64>().ok(),
                StoredValue::Set(_) => None,
            })
            .unwrap_or(0);

        let next = current + delta;
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: StoredValue::Scalar(next.to_string()),
                deadline: now + ttl,
            },
        );

        Ok(next)
    }

    async fn write_if_greater(&self, key: &str, value: u64, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let existing = entries
            .get(key)
            .filter(|entry| entry.live(now))
            .and_then(|entry| match &entry.value {
                StoredValue::Scalar(stored) => stored.parse::<u64>().ok(),
                StoredValue::Set(_) => None,
            });

        let accept = match existing {
            Some(stored) => value > stored,
            None => true,
        };

        if accept {
            entries.insert(
                key.to_string(),
                StoredEntry {
                    value: StoredValue::Scalar(value.to_string()),
                    deadline: now + ttl,
                },
            );
        }

        Ok(accept)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(entry) if entry.live(now) => {
                entry.deadline = now + ttl;
            }
            Some(_) => {
                entries.remove(key);
            }
            None => {}
        }

        Ok(())
    }
}
