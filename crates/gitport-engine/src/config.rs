//! Engine configuration
//!
//! Cache lifetimes and key namespacing for one import deployment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lifetime for cache keys written during an import (24 hours)
pub const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 86_400;

/// Bounded lifetime applied to bulk keys (dedup sets) once a collection
/// run completes (15 minutes)
pub const DEFAULT_DEDUP_TIMEOUT_SECS: u64 = 900;

/// Main import engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Namespace prefixed to every cache key, identifying the source
    /// provider so independent import deployments never collide
    pub namespace: String,
    /// Lifetime in seconds for cache keys (cursors, counters, dedup sets)
    pub cache_timeout_secs: u64,
    /// Lifetime in seconds applied to a collection's dedup set after the
    /// scheduling phase completes
    pub dedup_timeout_secs: u64,
}

impl ImportConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `GITPORT_CACHE_NAMESPACE`: cache key namespace
    /// - `GITPORT_CACHE_TIMEOUT_SECS`: default cache key lifetime
    /// - `GITPORT_DEDUP_TIMEOUT_SECS`: post-run dedup set lifetime
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            namespace: std::env::var("GITPORT_CACHE_NAMESPACE")
                .unwrap_or_else(|_| "gitport".to_string()),
            cache_timeout_secs: std::env::var("GITPORT_CACHE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CACHE_TIMEOUT_SECS),
            dedup_timeout_secs: std::env::var("GITPORT_DEDUP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DEDUP_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.namespace.is_empty() {
            anyhow::bail!("GITPORT_CACHE_NAMESPACE cannot be empty");
        }
        if self.namespace.contains('/') {
            anyhow::bail!(
                "GITPORT_CACHE_NAMESPACE cannot contain '/', got: {}",
                self.namespace
            );
        }
        if self.cache_timeout_secs == 0 {
            anyhow::bail!("GITPORT_CACHE_TIMEOUT_SECS must be greater than 0");
        }
        if self.dedup_timeout_secs == 0 {
            anyhow::bail!("GITPORT_DEDUP_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    /// Get the default cache key lifetime as Duration
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    /// Get the post-run dedup set lifetime as Duration
    pub fn dedup_timeout(&self) -> Duration {
        Duration::from_secs(self.dedup_timeout_secs)
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            namespace: "gitport".to_string(),
            cache_timeout_secs: DEFAULT_CACHE_TIMEOUT_SECS,
            dedup_timeout_secs: DEFAULT_DEDUP_TIMEOUT_SECS,
        }
    }
}
